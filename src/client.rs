use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::TransportError;

#[derive(Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    error: Option<Value>,
}

/// Settled result of one exchange with the backend
#[derive(Debug)]
pub enum ExchangeOutcome {
    Reply(String),
    /// The backend answered but flagged a processing failure
    AppError,
    Transport(TransportError),
}

#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn exchange(&self, message: &str) -> ExchangeOutcome;
}

#[derive(Clone)]
pub struct HttpChatClient {
    client: Client,
    endpoint: String,
}

impl HttpChatClient {
    pub fn new(endpoint: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }

    async fn post(&self, message: &str) -> Result<ChatResponse, TransportError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&ChatRequest { message })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(TransportError::Status(response.status()));
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl ChatBackend for HttpChatClient {
    async fn exchange(&self, message: &str) -> ExchangeOutcome {
        debug!(endpoint = %self.endpoint, "sending chat message");
        match self.post(message).await {
            Ok(body) => classify(body),
            Err(err) => ExchangeOutcome::Transport(err),
        }
    }
}

fn classify(body: ChatResponse) -> ExchangeOutcome {
    if body.error.as_ref().is_some_and(is_truthy) {
        return ExchangeOutcome::AppError;
    }
    match body.response {
        Some(reply) if !reply.trim().is_empty() => ExchangeOutcome::Reply(reply),
        _ => ExchangeOutcome::Transport(TransportError::MissingReply),
    }
}

/// JSON truthiness: null, false, zero and the empty string are falsy
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
