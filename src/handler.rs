use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};

use crate::app::App;
use crate::client::ChatBackend;
use crate::tui::AppEvent;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub fn handle_event<B: ChatBackend + 'static>(app: &mut App<B>, event: AppEvent) {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize(_, _) => {
            if app.view.follow_latest {
                app.view.scroll_to_bottom();
            }
        }
        AppEvent::Tick => app.tick_animation(),
        AppEvent::View(update) => app.apply_view_update(update),
    }
}

fn handle_key<B: ChatBackend + 'static>(app: &mut App<B>, key: KeyEvent) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    match key.code {
        KeyCode::Char('c') if ctrl => app.quit(),
        KeyCode::Esc => app.quit(),
        KeyCode::Char('t') if ctrl => app.toggle_theme(),

        // Enter is the same as pressing send
        KeyCode::Enter => app.send(),

        // Transcript scrolling
        KeyCode::PageUp => {
            let page = app.view.height.max(1);
            app.view.scroll_up(page);
        }
        KeyCode::PageDown => {
            let page = app.view.height.max(1);
            app.view.scroll_down(page);
        }

        // Line editing
        KeyCode::Backspace => {
            if app.input_cursor > 0 {
                app.input_cursor -= 1;
                let byte_pos = char_to_byte_index(&app.input, app.input_cursor);
                app.input.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            let char_count = app.input.chars().count();
            if app.input_cursor < char_count {
                let byte_pos = char_to_byte_index(&app.input, app.input_cursor);
                app.input.remove(byte_pos);
            }
        }
        KeyCode::Left => {
            app.input_cursor = app.input_cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = app.input.chars().count();
            app.input_cursor = (app.input_cursor + 1).min(char_count);
        }
        KeyCode::Home => {
            app.input_cursor = 0;
        }
        KeyCode::End => {
            app.input_cursor = app.input.chars().count();
        }
        KeyCode::Char(c) if !ctrl => {
            let byte_pos = char_to_byte_index(&app.input, app.input_cursor);
            app.input.insert(byte_pos, c);
            app.input_cursor += 1;
        }
        _ => {}
    }
}

fn handle_mouse<B: ChatBackend + 'static>(app: &mut App<B>, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::ScrollDown => app.view.scroll_down(3),
        MouseEventKind::ScrollUp => app.view.scroll_up(3),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ExchangeOutcome;
    use crate::exchange::ExchangeController;
    use crate::message::ChatRole;
    use crate::theme::{MemoryStore, Theme, ThemeToggle};
    use crate::transcript::ViewUpdate;
    use async_trait::async_trait;
    use std::time::Duration;
    use tokio::sync::mpsc;

    struct EchoBackend;

    #[async_trait]
    impl ChatBackend for EchoBackend {
        async fn exchange(&self, message: &str) -> ExchangeOutcome {
            ExchangeOutcome::Reply(format!("echo: {message}"))
        }
    }

    fn app() -> (App<EchoBackend>, mpsc::UnboundedReceiver<ViewUpdate>) {
        app_with_delay(Duration::ZERO)
    }

    fn app_with_delay(delay: Duration) -> (App<EchoBackend>, mpsc::UnboundedReceiver<ViewUpdate>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let controller = ExchangeController::new(EchoBackend, tx).with_reply_delay(delay);
        let theme = ThemeToggle::load_on_startup(
            Box::new(MemoryStore::default()) as crate::app::Preferences,
            Theme::Dark,
        );
        (App::new(controller, theme, "http://test/api/chat"), rx)
    }

    fn press(app: &mut App<EchoBackend>, code: KeyCode) {
        handle_event(app, AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE)));
    }

    fn type_text(app: &mut App<EchoBackend>, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    async fn pump(
        app: &mut App<EchoBackend>,
        rx: &mut mpsc::UnboundedReceiver<ViewUpdate>,
        n: usize,
    ) {
        for _ in 0..n {
            let update = tokio::time::timeout(Duration::from_secs(2), rx.recv())
                .await
                .expect("view update in time")
                .expect("view channel open");
            handle_event(app, AppEvent::View(update));
        }
    }

    #[test]
    fn test_char_to_byte_index() {
        assert_eq!(char_to_byte_index("héllo", 2), 3);
        assert_eq!(char_to_byte_index("abc", 10), 3);
    }

    #[tokio::test]
    async fn test_editing_with_cursor() {
        let (mut app, _rx) = app();
        type_text(&mut app, "helo");
        press(&mut app, KeyCode::Left);
        type_text(&mut app, "l");
        assert_eq!(app.input, "hello");

        press(&mut app, KeyCode::Home);
        press(&mut app, KeyCode::Delete);
        press(&mut app, KeyCode::End);
        press(&mut app, KeyCode::Backspace);
        assert_eq!(app.input, "ell");
        assert_eq!(app.input_cursor, 3);
    }

    #[tokio::test]
    async fn test_enter_on_blank_input_does_nothing() {
        let (mut app, mut rx) = app();
        type_text(&mut app, "   ");
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.input, "   ");
        assert!(!app.is_waiting());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_enter_sends_and_renders_reply() {
        let (mut app, mut rx) = app();
        type_text(&mut app, "What is your refund policy?");
        press(&mut app, KeyCode::Enter);

        assert!(app.input.is_empty());
        assert_eq!(app.input_cursor, 0);

        // paint, scroll, typing on, typing off, paint, scroll
        pump(&mut app, &mut rx, 6).await;

        assert!(!app.view.typing);
        assert_eq!(app.view.messages.len(), 2);
        assert_eq!(app.view.messages[0].role(), ChatRole::User);
        assert_eq!(app.view.messages[1].text(), "echo: What is your refund policy?");
        assert!(!app.is_waiting());
    }

    #[tokio::test]
    async fn test_enter_during_paced_reply_keeps_transcript_in_order() {
        let (mut app, mut rx) = app_with_delay(Duration::from_millis(200));
        type_text(&mut app, "one");
        press(&mut app, KeyCode::Enter);

        // paint, scroll, typing on, typing off; the reply is still pacing
        pump(&mut app, &mut rx, 4).await;
        assert!(!app.view.typing);

        type_text(&mut app, "two");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.input, "two");

        // reply paint, scroll
        pump(&mut app, &mut rx, 2).await;
        press(&mut app, KeyCode::Enter);
        assert!(app.input.is_empty());
        pump(&mut app, &mut rx, 6).await;

        let texts: Vec<&str> = app.view.messages.iter().map(|m| m.text()).collect();
        assert_eq!(texts, vec!["one", "echo: one", "two", "echo: two"]);
        assert!(!app.is_waiting());
    }

    #[tokio::test]
    async fn test_ctrl_t_toggles_theme() {
        let (mut app, _rx) = app();
        handle_event(
            &mut app,
            AppEvent::Key(KeyEvent::new(KeyCode::Char('t'), KeyModifiers::CONTROL)),
        );
        assert_eq!(app.theme(), Theme::Light);
        assert!(app.input.is_empty());
    }

    #[tokio::test]
    async fn test_esc_quits() {
        let (mut app, _rx) = app();
        press(&mut app, KeyCode::Esc);
        assert!(app.should_quit);
    }

    #[tokio::test]
    async fn test_tick_animates_only_while_typing() {
        let (mut app, _rx) = app();
        handle_event(&mut app, AppEvent::Tick);
        assert_eq!(app.animation_frame, 0);

        handle_event(&mut app, AppEvent::View(ViewUpdate::Typing(true)));
        handle_event(&mut app, AppEvent::Tick);
        handle_event(&mut app, AppEvent::Tick);
        assert_eq!(app.animation_frame, 2);
        handle_event(&mut app, AppEvent::Tick);
        assert_eq!(app.animation_frame, 0);
    }
}
