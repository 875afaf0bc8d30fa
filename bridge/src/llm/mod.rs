//! Remote-call capability: given normalized parameters, produce either one
//! [`Completion`] or a [`DeltaStream`] of partial updates.
//!
//! The engine never talks HTTP itself. [`ClientFactory`] builds one client per
//! (credential, endpoint) pair for the [`ClientCache`](crate::cache::ClientCache);
//! [`ChatBackend`] is the per-client call surface. Implementations: [`OpenAiBackend`]
//! (real API via `async-openai`) and [`MockBackend`] (scripted, for tests).

mod mock;
mod openai;

pub use mock::{MockBackend, MockFactory, MockStep};
pub use openai::{OpenAiBackend, OpenAiFactory};

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use stream_event::{TokenUsage, ToolCallRecord};
use thiserror::Error;

use crate::normalize::ChatParams;

/// One partial update to a single tool invocation, keyed by slot `index`.
///
/// `arguments` is a fragment to append, never a replacement.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ToolCallFragment {
    pub index: u32,
    pub id: Option<String>,
    pub kind: Option<String>,
    pub name: Option<String>,
    pub arguments: Option<String>,
}

/// One normalized streaming update. Any subset of fields may be set.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Delta {
    pub content: Option<String>,
    pub tool_calls: Vec<ToolCallFragment>,
    pub finish_reason: Option<String>,
    pub usage: Option<TokenUsage>,
}

impl Delta {
    pub fn content(text: impl Into<String>) -> Self {
        Self {
            content: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn tool_call(fragment: ToolCallFragment) -> Self {
        Self {
            tool_calls: vec![fragment],
            ..Default::default()
        }
    }

    pub fn finish(reason: impl Into<String>) -> Self {
        Self {
            finish_reason: Some(reason.into()),
            ..Default::default()
        }
    }

    pub fn usage(usage: TokenUsage) -> Self {
        Self {
            usage: Some(usage),
            ..Default::default()
        }
    }
}

/// One non-streaming response.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Completion {
    pub content: Option<String>,
    pub tool_calls: Vec<ToolCallRecord>,
    pub finish_reason: Option<String>,
    pub usage: Option<TokenUsage>,
}

/// Errors from the remote-call capability.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("OpenAI API error: {0}")]
    OpenAi(#[from] async_openai::error::OpenAIError),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("provider error: {0}")]
    Remote(String),
}

/// Ordered partial updates for one in-flight request.
pub type DeltaStream = Pin<Box<dyn Stream<Item = Result<Delta, BackendError>> + Send>>;

/// Client bound to one (credential, endpoint) pair.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Single response (request has `stream: false`).
    async fn complete(&self, params: &ChatParams) -> Result<Completion, BackendError>;

    /// Opens the update sequence (request has `stream: true`). Errors here mean the
    /// stream never started; errors inside the stream are mid-stream failures.
    async fn stream(&self, params: &ChatParams) -> Result<DeltaStream, BackendError>;
}

/// Builds clients for the cache. `endpoint` is `None` for the provider default.
pub trait ClientFactory: Send + Sync {
    type Client: ChatBackend + 'static;

    /// Display name used in the `ready` message (e.g. `"OpenAI"`).
    fn provider_name(&self) -> &str;

    fn create(&self, credential: &str, endpoint: Option<&str>) -> Self::Client;
}
