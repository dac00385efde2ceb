pub mod app;
pub mod client;
pub mod config;
pub mod error;
pub mod exchange;
pub mod handler;
pub mod message;
pub mod theme;
pub mod transcript;
pub mod tui;
pub mod ui;

// Re-export main types for convenience
pub use client::{ChatBackend, ExchangeOutcome, HttpChatClient};
pub use config::Config;
pub use error::TransportError;
pub use exchange::{ExchangeController, ExchangeState, PendingExchange};
pub use message::{ChatMessage, ChatRole};
pub use theme::{FileStore, MemoryStore, PreferenceStore, Theme, ThemeToggle};
pub use transcript::{Transcript, ViewSink, ViewUpdate};
