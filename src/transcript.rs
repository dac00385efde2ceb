//! Append-only transcript and the view sink that paints it
//!
//! The transcript only knows about entries and how to hand them to a view.
//! It has no idea whether an exchange is in flight.

use tokio::sync::mpsc::UnboundedSender;

use crate::message::{ChatMessage, ChatRole};

/// Paint instructions emitted by the transcript
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewUpdate {
    Paint(ChatMessage),
    ScrollToLatest,
    Typing(bool),
}

/// Presentation capability the transcript writes to
pub trait ViewSink: Send {
    fn paint(&mut self, message: &ChatMessage);
    fn scroll_to_latest(&mut self);
    fn show_typing(&mut self, visible: bool);
}

impl ViewSink for UnboundedSender<ViewUpdate> {
    // A closed receiver means the view is gone; nothing left to paint.
    fn paint(&mut self, message: &ChatMessage) {
        let _ = self.send(ViewUpdate::Paint(message.clone()));
    }

    fn scroll_to_latest(&mut self) {
        let _ = self.send(ViewUpdate::ScrollToLatest);
    }

    fn show_typing(&mut self, visible: bool) {
        let _ = self.send(ViewUpdate::Typing(visible));
    }
}

/// Append `entry` as the newest item, keeping everything else in order
pub fn appended(mut entries: Vec<ChatMessage>, entry: ChatMessage) -> Vec<ChatMessage> {
    entries.push(entry);
    entries
}

pub struct Transcript<S> {
    entries: Vec<ChatMessage>,
    sink: S,
}

impl<S: ViewSink> Transcript<S> {
    pub fn new(sink: S) -> Self {
        Self {
            entries: Vec::new(),
            sink,
        }
    }

    /// Stamp, store and paint a new entry, then bring it into view
    pub fn append(&mut self, role: ChatRole, text: &str) -> &ChatMessage {
        let message = ChatMessage::new(role, text);
        self.sink.paint(&message);
        self.entries = appended(std::mem::take(&mut self.entries), message);
        self.sink.scroll_to_latest();
        let last = self.entries.len() - 1;
        &self.entries[last]
    }

    pub fn show_typing(&mut self, visible: bool) {
        self.sink.show_typing(visible);
    }
}

impl<S> Transcript<S> {
    pub fn entries(&self) -> &[ChatMessage] {
        &self.entries
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.entries.last()
    }
}
