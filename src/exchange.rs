//! Send/receive lifecycle for one message at a time
//!
//! `submit` is `begin` (validate, render the user message, enter `Waiting`)
//! followed by `complete` (network call, leave `Waiting`, render the outcome).
//! Hosts that must keep handling input while a request is in flight call the
//! two halves separately and spawn `complete`.
//!
//! A new exchange is only accepted from `Idle`, so replies always land
//! directly after the message they answer.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::{debug, error, warn};

use crate::client::{ChatBackend, ExchangeOutcome};
use crate::error::TransportError;
use crate::message::{ChatMessage, ChatRole};
use crate::transcript::{Transcript, ViewSink};

pub const CONNECTION_FALLBACK: &str =
    "Sorry, I'm having trouble connecting to the server. Please try again later.";
pub const PROCESSING_FALLBACK: &str = "Sorry, I encountered an error. Please try again.";

pub const DEFAULT_REPLY_DELAY: Duration = Duration::from_millis(500);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExchangeState {
    #[default]
    Idle,
    /// Request in flight, typing indicator shown
    Waiting,
    /// Request settled, reply held back by the pacing delay
    Replying,
}

struct Session<S> {
    transcript: Transcript<S>,
    state: ExchangeState,
}

type SharedSession<S> = Arc<Mutex<Session<S>>>;

fn lock<S>(session: &SharedSession<S>) -> MutexGuard<'_, Session<S>> {
    session.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct ExchangeController<B, S> {
    backend: Arc<B>,
    session: SharedSession<S>,
    reply_delay: Duration,
    request_timeout: Duration,
}

impl<B, S> Clone for ExchangeController<B, S> {
    fn clone(&self) -> Self {
        Self {
            backend: self.backend.clone(),
            session: self.session.clone(),
            reply_delay: self.reply_delay,
            request_timeout: self.request_timeout,
        }
    }
}

/// An exchange that has entered `Waiting` and still owes a reply.
///
/// Dropping it without calling `ExchangeController::complete` still hides the
/// indicator and returns the controller to `Idle`.
pub struct PendingExchange<S: ViewSink> {
    text: String,
    session: SharedSession<S>,
    settled: bool,
    finished: bool,
}

impl<S: ViewSink> PendingExchange<S> {
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Leave `Waiting` and hide the indicator, once
    fn settle(&mut self) {
        if self.settled {
            return;
        }
        self.settled = true;
        let mut session = lock(&self.session);
        session.state = ExchangeState::Replying;
        session.transcript.show_typing(false);
    }

    /// Render the assistant's answer and free the slot for the next exchange
    fn finish(mut self, reply: &str) {
        self.settle();
        self.finished = true;
        let mut session = lock(&self.session);
        session.transcript.append(ChatRole::Assistant, reply);
        session.state = ExchangeState::Idle;
    }
}

impl<S: ViewSink> Drop for PendingExchange<S> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        debug!(settled = self.settled, "exchange abandoned before its reply");
        self.settle();
        lock(&self.session).state = ExchangeState::Idle;
    }
}

impl<B, S> ExchangeController<B, S> {
    pub fn state(&self) -> ExchangeState {
        lock(&self.session).state
    }

    pub fn entries(&self) -> Vec<ChatMessage> {
        lock(&self.session).transcript.entries().to_vec()
    }

    pub fn last_entry(&self) -> Option<ChatMessage> {
        lock(&self.session).transcript.last().cloned()
    }
}

impl<B, S> ExchangeController<B, S>
where
    B: ChatBackend,
    S: ViewSink,
{
    pub fn new(backend: B, sink: S) -> Self {
        Self {
            backend: Arc::new(backend),
            session: Arc::new(Mutex::new(Session {
                transcript: Transcript::new(sink),
                state: ExchangeState::Idle,
            })),
            reply_delay: DEFAULT_REPLY_DELAY,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_reply_delay(mut self, delay: Duration) -> Self {
        self.reply_delay = delay;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Send the contents of `input` and render the reply once it arrives
    pub async fn submit(&self, input: &mut String) {
        if let Some(pending) = self.begin(input) {
            self.complete(pending).await;
        }
    }

    /// Validate and render the user's message, then enter `Waiting`.
    ///
    /// Returns `None` without touching `input` when it is blank or when the
    /// previous exchange has not rendered its reply yet.
    pub fn begin(&self, input: &mut String) -> Option<PendingExchange<S>> {
        let text = input.trim();
        if text.is_empty() {
            return None;
        }

        let mut session = lock(&self.session);
        if session.state != ExchangeState::Idle {
            debug!(state = ?session.state, "rejected message while a reply is pending");
            return None;
        }

        let text = text.to_string();
        session.transcript.append(ChatRole::User, &text);
        input.clear();

        session.state = ExchangeState::Waiting;
        session.transcript.show_typing(true);
        drop(session);

        Some(PendingExchange {
            text,
            session: self.session.clone(),
            settled: false,
            finished: false,
        })
    }

    /// Issue the request for `pending`, leave `Waiting`, then render the outcome
    pub async fn complete(&self, mut pending: PendingExchange<S>) {
        let outcome = match tokio::time::timeout(
            self.request_timeout,
            self.backend.exchange(&pending.text),
        )
        .await
        {
            Ok(outcome) => outcome,
            Err(_) => ExchangeOutcome::Transport(TransportError::Timeout(self.request_timeout)),
        };

        pending.settle();

        let reply = match outcome {
            ExchangeOutcome::Reply(reply) => reply,
            ExchangeOutcome::AppError => {
                warn!("backend flagged a processing error");
                PROCESSING_FALLBACK.to_string()
            }
            ExchangeOutcome::Transport(err) => {
                error!(error = %err, "chat request failed");
                pending.finish(CONNECTION_FALLBACK);
                return;
            }
        };

        if !self.reply_delay.is_zero() {
            tokio::time::sleep(self.reply_delay).await;
        }
        pending.finish(&reply);
    }

    /// Render an assistant message that is not tied to an exchange
    pub fn announce(&self, text: &str) {
        lock(&self.session)
            .transcript
            .append(ChatRole::Assistant, text);
    }
}
