use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

use crate::client::{ChatBackend, HttpChatClient};
use crate::exchange::{ExchangeController, ExchangeState};
use crate::message::ChatMessage;
use crate::theme::{PreferenceStore, Theme, ThemeToggle};
use crate::transcript::ViewUpdate;
use crate::ui;

pub type Controller<B> = ExchangeController<B, UnboundedSender<ViewUpdate>>;
pub type Preferences = Box<dyn PreferenceStore + Send>;

/// What the terminal currently shows of the transcript
#[derive(Debug, Default)]
pub struct ChatView {
    pub messages: Vec<ChatMessage>,
    pub typing: bool,
    pub scroll: u16,
    pub follow_latest: bool,
    pub height: u16, // inner height of the chat area, set during render
    pub width: u16,  // inner width of the chat area, set during render
}

impl ChatView {
    /// Number of rendered rows, wrapped the same way `ui::render_chat` wraps them
    pub fn total_lines(&self) -> u16 {
        // Use actual chat width for wrap calculation, default to 50 if not set
        let wrap_width = if self.width > 0 { self.width } else { 50 };
        ui::chat_rows(self, wrap_width).min(u16::MAX as usize) as u16
    }

    pub fn scroll_to_bottom(&mut self) {
        let visible_height = if self.height > 0 { self.height } else { 20 };
        self.scroll = self.total_lines().saturating_sub(visible_height);
        self.follow_latest = true;
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.scroll = self.scroll.saturating_sub(lines);
        self.follow_latest = false;
    }

    pub fn scroll_down(&mut self, lines: u16) {
        let visible_height = if self.height > 0 { self.height } else { 20 };
        let max = self.total_lines().saturating_sub(visible_height);
        self.scroll = self.scroll.saturating_add(lines).min(max);
        self.follow_latest = self.scroll == max;
    }
}

pub struct App<B = HttpChatClient> {
    pub should_quit: bool,

    // Input state
    pub input: String,
    pub input_cursor: usize, // cursor position in chars

    pub view: ChatView,
    pub animation_frame: u8, // 0-2 for ellipsis animation

    pub endpoint: String,
    controller: Controller<B>,
    exchange_task: Option<JoinHandle<()>>,
    theme: ThemeToggle<Preferences>,
}

impl<B> App<B> {
    pub fn new(
        controller: Controller<B>,
        theme: ThemeToggle<Preferences>,
        endpoint: impl Into<String>,
    ) -> Self {
        Self {
            should_quit: false,
            input: String::new(),
            input_cursor: 0,
            view: ChatView::default(),
            animation_frame: 0,
            endpoint: endpoint.into(),
            controller,
            exchange_task: None,
            theme,
        }
    }

    pub fn theme(&self) -> Theme {
        self.theme.current()
    }

    pub fn toggle_theme(&mut self) {
        self.theme.toggle();
    }

    pub fn is_waiting(&self) -> bool {
        self.controller.state() == ExchangeState::Waiting
    }

    pub fn apply_view_update(&mut self, update: ViewUpdate) {
        match update {
            ViewUpdate::Paint(message) => self.view.messages.push(message),
            ViewUpdate::ScrollToLatest => self.view.scroll_to_bottom(),
            ViewUpdate::Typing(visible) => {
                self.view.typing = visible;
                self.animation_frame = 0;
                if self.view.follow_latest {
                    self.view.scroll_to_bottom();
                }
            }
        }
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.view.typing {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
        // Aborting drops the pending exchange, which clears the waiting state.
        if let Some(task) = self.exchange_task.take() {
            task.abort();
        }
    }
}

impl<B> App<B>
where
    B: ChatBackend + 'static,
{
    /// Hand the input line to the controller and let the reply arrive in the background.
    ///
    /// The controller accepts a new message only after the previous reply is
    /// rendered, so a replaced task handle has nothing left to abort.
    pub fn send(&mut self) {
        let Some(pending) = self.controller.begin(&mut self.input) else {
            return;
        };
        self.input_cursor = 0;

        let controller = self.controller.clone();
        self.exchange_task = Some(tokio::spawn(async move {
            controller.complete(pending).await;
        }));
    }

    /// Show `text` as an assistant message after `delay`, without an exchange
    pub fn greet_after(&self, text: String, delay: std::time::Duration) {
        let controller = self.controller.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            controller.announce(&text);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::ChatRole;

    fn view_with(messages: &[&str], width: u16, height: u16) -> ChatView {
        ChatView {
            messages: messages
                .iter()
                .map(|text| ChatMessage::new(ChatRole::User, *text))
                .collect(),
            width,
            height,
            ..ChatView::default()
        }
    }

    #[test]
    fn test_total_lines_counts_wrapping() {
        // header + 2 wrapped rows + blank
        let view = view_with(&["abcdefghijklmnopqrstuvwx"], 12, 10);
        assert_eq!(view.total_lines(), 4);
    }

    #[test]
    fn test_total_lines_wraps_on_word_boundaries() {
        // 23 chars, but no two words share a 12-column row
        let view = view_with(&["aaaaaaa bbbbbbb ccccccc"], 12, 10);
        assert_eq!(view.total_lines(), 5);
    }

    #[test]
    fn test_total_lines_includes_typing_indicator() {
        let mut view = view_with(&["hi"], 20, 10);
        let idle = view.total_lines();
        view.typing = true;
        assert_eq!(view.total_lines(), idle + 2);
    }

    #[test]
    fn test_scroll_to_bottom_shows_last_rows() {
        let mut view = view_with(&["one", "two", "three", "four"], 20, 5);
        view.scroll_to_bottom();
        assert_eq!(view.scroll, 12 - 5);
        assert!(view.follow_latest);
    }

    #[test]
    fn test_scroll_up_stops_following() {
        let mut view = view_with(&["one", "two", "three", "four"], 20, 5);
        view.scroll_to_bottom();
        view.scroll_up(3);
        assert_eq!(view.scroll, 4);
        assert!(!view.follow_latest);

        view.scroll_down(10);
        assert_eq!(view.scroll, 7);
        assert!(view.follow_latest);
    }
}
