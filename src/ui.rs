use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, ChatView};
use crate::message::ChatRole;
use crate::theme::Theme;

/// Colours for the whole screen under one theme
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub background: Color,
    pub text: Color,
    pub muted: Color,
    pub border: Color,
    pub accent: Color,
    pub user: Color,
    pub assistant: Color,
}

impl Palette {
    pub fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Dark => Self {
                background: Color::Rgb(24, 24, 27),
                text: Color::Gray,
                muted: Color::DarkGray,
                border: Color::DarkGray,
                accent: Color::Cyan,
                user: Color::Cyan,
                assistant: Color::Yellow,
            },
            Theme::Light => Self {
                background: Color::Rgb(248, 249, 250),
                text: Color::Black,
                muted: Color::Gray,
                border: Color::Gray,
                accent: Color::Blue,
                user: Color::Blue,
                assistant: Color::Magenta,
            },
        }
    }
}

pub fn render<B>(app: &mut App<B>, frame: &mut Frame) {
    let palette = Palette::for_theme(app.theme());
    let area = frame.area();

    frame.render_widget(
        Block::default().style(Style::default().bg(palette.background).fg(palette.text)),
        area,
    );

    // Main layout: header, chat, input, footer
    let [header_area, chat_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area, &palette);
    render_chat(app, frame, chat_area, &palette);
    render_input(app, frame, input_area, &palette);
    render_footer(app, frame, footer_area, &palette);
}

fn render_header<B>(app: &App<B>, frame: &mut Frame, area: Rect, palette: &Palette) {
    let theme_icon = match app.theme() {
        Theme::Dark => "☾ dark",
        Theme::Light => "☀ light",
    };

    let title = Line::from(vec![
        Span::styled(" Aphator Tech Support ", Style::default().fg(palette.accent).bold()),
        Span::styled(app.endpoint.as_str(), Style::default().fg(palette.muted)),
        Span::raw(" "),
        Span::styled(theme_icon, Style::default().fg(palette.muted)),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(palette.muted),
        ),
    ]);

    frame.render_widget(Paragraph::new(title), area);
}

fn render_chat<B>(app: &mut App<B>, frame: &mut Frame, area: Rect, palette: &Palette) {
    // Store chat area dimensions for scroll calculations (inner size minus borders)
    app.view.height = area.height.saturating_sub(2);
    app.view.width = area.width.saturating_sub(2);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.border))
        .title(" Chat ");

    let text = chat_text(&app.view, app.animation_frame, palette);

    let chat = Paragraph::new(text)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((app.view.scroll, 0));

    frame.render_widget(chat, area);
}

/// Rows the transcript occupies when wrapped to `width`, as `render_chat` draws it
pub fn chat_rows(view: &ChatView, width: u16) -> usize {
    // Widest ellipsis frame, so the count never falls short while animating
    let text = chat_text(view, 2, &Palette::for_theme(Theme::default()));
    Paragraph::new(text).wrap(Wrap { trim: false }).line_count(width)
}

fn chat_text(view: &ChatView, animation_frame: u8, palette: &Palette) -> Text<'static> {
    if view.messages.is_empty() && !view.typing {
        return Text::from(Span::styled(
            "Ask about our crypto and tech services...",
            Style::default().fg(palette.muted),
        ));
    }

    let mut lines: Vec<Line> = Vec::new();

    for msg in &view.messages {
        let role_color = match msg.role() {
            ChatRole::User => palette.user,
            ChatRole::Assistant => palette.assistant,
        };
        lines.push(Line::from(vec![
            Span::styled(
                msg.role().label(),
                Style::default().fg(role_color).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("  {}", msg.time_label()),
                Style::default().fg(palette.muted),
            ),
        ]));
        // Raw spans only; message text is never interpreted
        for line in msg.text().lines() {
            lines.push(Line::from(Span::raw(line.to_string())));
        }
        lines.push(Line::default());
    }

    if view.typing {
        lines.push(Line::from(Span::styled(
            ChatRole::Assistant.label(),
            Style::default().fg(palette.assistant).add_modifier(Modifier::BOLD),
        )));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("typing{}", dots),
            Style::default().fg(palette.muted).add_modifier(Modifier::ITALIC),
        )));
    }

    Text::from(lines)
}

fn render_input<B>(app: &App<B>, frame: &mut Frame, area: Rect, palette: &Palette) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.accent))
        .title(" Message (Enter to send) ");

    // Keep the cursor visible with horizontal scrolling
    let inner_width = area.width.saturating_sub(2) as usize;
    let cursor_pos = app.input_cursor;
    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let visible_text: String = app
        .input
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(palette.text))
        .block(block);
    frame.render_widget(input, area);

    let cursor_x = (cursor_pos - scroll_offset) as u16;
    frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
}

fn render_footer<B>(app: &App<B>, frame: &mut Frame, area: Rect, palette: &Palette) {
    let status = if app.view.typing {
        Span::styled(" WAITING ", Style::default().bg(Color::Yellow).fg(Color::Black))
    } else {
        Span::styled(" READY ", Style::default().bg(palette.accent).fg(Color::White))
    };

    let hints = Span::styled(
        " Enter send | PgUp/PgDn scroll | Ctrl+T theme | Esc quit",
        Style::default().fg(palette.muted),
    );

    frame.render_widget(Paragraph::new(Line::from(vec![status, hints])), area);
}
