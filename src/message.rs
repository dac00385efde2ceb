//! UI-agnostic transcript types
//!
//! Messages are created at render time and never mutated afterwards. Nothing
//! here touches the terminal, so the controller and its tests can share them.

use chrono::{DateTime, Local};

/// The role of a chat message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    pub fn label(&self) -> &'static str {
        match self {
            ChatRole::User => "You",
            ChatRole::Assistant => "Aphator",
        }
    }
}

/// One transcript entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    role: ChatRole,
    text: String,
    timestamp: DateTime<Local>,
}

impl ChatMessage {
    /// Stamp a new message with the current local time
    pub fn new(role: ChatRole, text: impl Into<String>) -> Self {
        Self::at(role, text, Local::now())
    }

    pub fn at(role: ChatRole, text: impl Into<String>, timestamp: DateTime<Local>) -> Self {
        Self {
            role,
            text: text.into(),
            timestamp,
        }
    }

    pub fn role(&self) -> ChatRole {
        self.role
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn timestamp(&self) -> DateTime<Local> {
        self.timestamp
    }

    /// Zero-padded local `HH:MM`
    pub fn time_label(&self) -> String {
        self.timestamp.format("%H:%M").to_string()
    }
}
