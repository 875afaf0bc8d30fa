//! Per-request error type and its mapping onto `error` events.

use std::time::Duration;

use stream_event::ErrorCode;
use thiserror::Error;

use crate::llm::BackendError;
use crate::normalize::ValidationError;

/// Why one request did not end with `end`, or why the loop had to stop.
///
/// Every variant except [`Input`](BridgeError::Input) and [`Output`](BridgeError::Output)
/// is recoverable: it becomes one `error` event and the loop reads the next line.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("Request processing error: {0}")]
    Validation(#[from] ValidationError),
    #[error("Non-streaming error: {0}")]
    Completion(#[source] BackendError),
    /// The update sequence could not be opened.
    #[error("Streaming error: {0}")]
    StreamOpen(#[source] BackendError),
    /// The update sequence failed part-way; partial accumulation is discarded.
    #[error("Streaming error: {0}")]
    Stream(#[source] BackendError),
    #[error("Request timed out after {}s", .0.as_secs_f64())]
    Timeout(Duration),
    #[error("Request interrupted by shutdown")]
    Interrupted,
    #[error("read input channel: {0}")]
    Input(#[source] std::io::Error),
    #[error("write output channel: {0}")]
    Output(#[from] std::io::Error),
}

impl BridgeError {
    /// Errors that end the command loop instead of becoming an `error` event.
    pub fn is_fatal(&self) -> bool {
        matches!(self, BridgeError::Input(_) | BridgeError::Output(_))
    }

    pub fn error_code(&self) -> Option<ErrorCode> {
        match self {
            BridgeError::Validation(_) => Some(ErrorCode::ValidationError),
            BridgeError::Completion(_) | BridgeError::StreamOpen(_) => Some(ErrorCode::RemoteError),
            BridgeError::Stream(_) => Some(ErrorCode::StreamError),
            BridgeError::Timeout(_) => Some(ErrorCode::RequestTimeout),
            BridgeError::Interrupted => Some(ErrorCode::Interrupted),
            BridgeError::Input(_) | BridgeError::Output(_) => None,
        }
    }
}

/// Renders an error and its `source()` chain, one cause per line.
pub fn diagnostic_trace(err: &(dyn std::error::Error + 'static)) -> String {
    let mut out = format!("Error: {}", err);
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str("\n  caused by: ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}
