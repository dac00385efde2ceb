use std::time::Duration;

use thiserror::Error;

/// Why a reply could not be obtained from the backend.
///
/// These only ever reach the log; the transcript shows a fixed fallback.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("backend returned status {0}")]
    Status(reqwest::StatusCode),
    #[error("malformed response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("response carried no reply text and no error flag")]
    MissingReply,
    #[error("no response within {0:?}")]
    Timeout(Duration),
}
