//! Delta Accumulator: rebuilds one complete response from an ordered sequence of
//! partial updates, forwarding each fragment as a `chunk` event as it arrives.
//!
//! Merge rules per tool-call slot:
//! - `id`, `type`, function `name`: last non-empty value wins;
//! - `arguments`: every fragment is appended in arrival order.
//!
//! A usage snapshot is the terminal marker: [`accumulate`] stops pulling from the
//! stream as soon as one has been applied, even if the transport has more to send.

use std::collections::BTreeMap;
use std::io::{self, Write};

use stream_event::{BridgeEvent, FunctionCall, TokenUsage, ToolCallProgress, ToolCallRecord};
use tokio_stream::StreamExt;
use tracing::{debug, trace};

use crate::emitter::Emitter;
use crate::error::BridgeError;
use crate::llm::{Completion, Delta, DeltaStream, ToolCallFragment};

const DEFAULT_FINISH_REASON: &str = "stop";
const DEFAULT_TOOL_TYPE: &str = "function";

/// Resolved state of one tool-call slot.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AccumulatedToolCall {
    pub id: String,
    /// Empty until a fragment names a type; finalized as `"function"`.
    pub kind: String,
    pub name: String,
    pub arguments: String,
}

fn overwrite_if_non_empty(slot: &mut String, value: Option<&str>) {
    if let Some(v) = value.filter(|v| !v.is_empty()) {
        slot.clear();
        slot.push_str(v);
    }
}

impl AccumulatedToolCall {
    pub fn merge(&mut self, fragment: &ToolCallFragment) {
        overwrite_if_non_empty(&mut self.id, fragment.id.as_deref());
        overwrite_if_non_empty(&mut self.kind, fragment.kind.as_deref());
        overwrite_if_non_empty(&mut self.name, fragment.name.as_deref());
        if let Some(args) = &fragment.arguments {
            self.arguments.push_str(args);
        }
    }

    pub fn into_record(self) -> ToolCallRecord {
        ToolCallRecord {
            id: self.id,
            kind: if self.kind.is_empty() {
                DEFAULT_TOOL_TYPE.to_string()
            } else {
                self.kind
            },
            function: FunctionCall {
                name: self.name,
                arguments: self.arguments,
            },
        }
    }
}

/// Whether the caller should keep feeding updates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Progress {
    Continue,
    /// A usage snapshot arrived; finalize now.
    Finished,
}

/// Per-request accumulation state. Never shared between requests.
#[derive(Debug, Default)]
pub struct ResponseState {
    content: String,
    tool_calls: BTreeMap<u32, AccumulatedToolCall>,
    finish_reason: Option<String>,
    usage: Option<TokenUsage>,
    updates: usize,
}

impl ResponseState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn tool_call(&self, index: u32) -> Option<&AccumulatedToolCall> {
        self.tool_calls.get(&index)
    }

    /// Applies one update and forwards its fragments through `emitter`.
    ///
    /// Order inside one update: content, tool-call fragments, finish reason, usage.
    pub fn apply<W: Write>(
        &mut self,
        delta: Delta,
        emitter: &mut Emitter<W>,
    ) -> io::Result<Progress> {
        self.updates += 1;

        if let Some(text) = delta.content.filter(|t| !t.is_empty()) {
            self.content.push_str(&text);
            emitter.content_chunk(&text)?;
        }

        for fragment in delta.tool_calls {
            self.tool_calls
                .entry(fragment.index)
                .or_default()
                .merge(&fragment);
            emitter.tool_call_progress(ToolCallProgress {
                index: fragment.index,
                id: fragment.id,
                function_name: fragment.name,
                arguments_fragment: fragment.arguments,
            })?;
        }

        if let Some(reason) = delta.finish_reason.filter(|r| !r.is_empty()) {
            self.finish_reason = Some(reason);
        }

        match delta.usage {
            Some(usage) => {
                self.usage = Some(usage);
                Ok(Progress::Finished)
            }
            None => Ok(Progress::Continue),
        }
    }

    /// Finalizes: tool calls ascending by slot index, `None` when there were none.
    pub fn finish(self) -> FinalResponse {
        let tool_calls = (!self.tool_calls.is_empty()).then(|| {
            self.tool_calls
                .into_values()
                .map(AccumulatedToolCall::into_record)
                .collect()
        });
        FinalResponse {
            content: self.content,
            tool_calls,
            finish_reason: self
                .finish_reason
                .unwrap_or_else(|| DEFAULT_FINISH_REASON.to_string()),
            usage: self.usage,
        }
    }
}

/// Complete result of one request, ready to become an `end` event.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FinalResponse {
    pub content: String,
    pub tool_calls: Option<Vec<ToolCallRecord>>,
    pub finish_reason: String,
    pub usage: Option<TokenUsage>,
}

impl FinalResponse {
    /// Maps a non-streaming response directly.
    pub fn from_completion(completion: Completion) -> Self {
        Self {
            content: completion.content.unwrap_or_default(),
            tool_calls: (!completion.tool_calls.is_empty()).then_some(completion.tool_calls),
            finish_reason: completion
                .finish_reason
                .filter(|r| !r.is_empty())
                .unwrap_or_else(|| DEFAULT_FINISH_REASON.to_string()),
            usage: completion.usage,
        }
    }

    pub fn into_event(self) -> BridgeEvent {
        BridgeEvent::End {
            success: true,
            content: self.content,
            tool_calls: self.tool_calls,
            finish_reason: self.finish_reason,
            token_usage: self.usage.unwrap_or_default(),
        }
    }
}

/// Drains `stream` into a fresh [`ResponseState`], emitting `chunk` events on the way.
///
/// Returns at the first usage snapshot, or when the stream ends. A stream error
/// aborts with [`BridgeError::Stream`] and the partial state is dropped.
pub async fn accumulate<W: Write>(
    mut stream: DeltaStream,
    emitter: &mut Emitter<W>,
) -> Result<FinalResponse, BridgeError> {
    let mut state = ResponseState::new();
    while let Some(item) = stream.next().await {
        let delta = item.map_err(BridgeError::Stream)?;
        trace!(update = state.updates, delta = ?delta, "stream update");
        if state.apply(delta, emitter)? == Progress::Finished {
            debug!(updates = state.updates, "usage snapshot received, finalizing");
            return Ok(state.finish());
        }
    }
    debug!(updates = state.updates, "stream closed without usage");
    Ok(state.finish())
}
