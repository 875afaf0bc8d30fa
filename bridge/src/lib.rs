//! # bridge
//!
//! Engine of the `llm-bridge` process: reads line-delimited chat-completion requests,
//! forwards each one to a remote model API, and writes the response back as
//! normalized, line-delimited JSON events ([`stream_event::BridgeEvent`]).
//!
//! ## Main modules
//!
//! - [`request`]: input lines ([`Command`]: `PING`, `EXIT` or a JSON [`Request`]).
//! - [`normalize`]: validation and defaults, producing [`ChatParams`].
//! - [`cache`]: [`ClientCache`], one client per (credential, endpoint).
//! - [`llm`]: [`ChatBackend`] / [`ClientFactory`] and the OpenAI and mock implementations.
//! - [`accumulator`]: rebuilds a full response from streamed [`Delta`]s.
//! - [`emitter`]: [`Emitter`], one flushed JSON line per event.
//! - [`runner`]: [`Bridge`], the sequential command loop.
//!
//! ## Example: one non-streaming request against the mock backend
//!
//! ```rust
//! use bridge::{Bridge, BridgeOptions, Completion, Emitter, MockBackend, MockFactory};
//! use tokio_util::sync::CancellationToken;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let backend = MockBackend::new().with_completion(Completion {
//!     content: Some("Hello!".into()),
//!     ..Default::default()
//! });
//! let mut bridge = Bridge::new(MockFactory::new(backend), BridgeOptions::default());
//! let mut emitter = Emitter::new(Vec::new());
//! let input = "{\"api_key\":\"k\",\"model\":\"m\",\"stream\":false}\n";
//!
//! bridge
//!     .run(input.as_bytes(), &mut emitter, CancellationToken::new())
//!     .await
//!     .unwrap();
//!
//! let out = String::from_utf8(emitter.into_inner()).unwrap();
//! assert!(out.lines().last().unwrap().starts_with("{\"type\":\"end\""));
//! # }
//! ```

pub mod accumulator;
pub mod cache;
pub mod emitter;
pub mod error;
pub mod llm;
pub mod normalize;
pub mod request;
pub mod runner;

pub use accumulator::{accumulate, AccumulatedToolCall, FinalResponse, Progress, ResponseState};
pub use cache::{normalize_endpoint, ClientCache};
pub use emitter::Emitter;
pub use error::{diagnostic_trace, BridgeError};
pub use llm::{
    BackendError, ChatBackend, ClientFactory, Completion, Delta, DeltaStream, MockBackend,
    MockFactory, MockStep, OpenAiBackend, OpenAiFactory, ToolCallFragment,
};
pub use normalize::{normalize, ChatParams, Normalized, Target, ValidationError};
pub use request::{Command, Request, EXIT, PING};
pub use runner::{Bridge, BridgeOptions};
