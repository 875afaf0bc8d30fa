//! Protocol-level event types: `type` tag + payload.
//! Opaque fields use `serde_json::Value`; everything the bridge itself produces is typed.

use serde::{Deserialize, Serialize};

/// Token usage for one completed request.
///
/// Always present on `end`; all zeros when the provider reported nothing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub total_tokens: u32,
}

impl TokenUsage {
    pub fn new(input_tokens: u32, output_tokens: u32, total_tokens: u32) -> Self {
        Self {
            input_tokens,
            output_tokens,
            total_tokens,
        }
    }
}

/// Function part of a finished tool call.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    pub arguments: String,
}

/// One finished tool call as reported in `end.tool_calls`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCallRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub function: FunctionCall,
}

/// Raw per-fragment values of one streamed tool-call update.
///
/// Fields are whatever the fragment carried, `null` when absent; consumers that
/// want running arguments concatenate `arguments_fragment` themselves.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCallProgress {
    pub index: u32,
    pub id: Option<String>,
    pub function_name: Option<String>,
    pub arguments_fragment: Option<String>,
}

/// Payload of a `chunk` event, tagged by `chunk_type` with the body under `data`.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "chunk_type", content = "data", rename_all = "snake_case")]
pub enum ChunkData {
    /// Only the new text fragment, never the running text.
    Content(String),
    ToolCallProgress(ToolCallProgress),
}

/// Machine-readable error classification carried by `error.error_code`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// The remote-call capability could not be resolved at startup.
    MissingProvider,
    MalformedInput,
    ValidationError,
    RemoteError,
    StreamError,
    RequestTimeout,
    Interrupted,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::MissingProvider => "MISSING_PROVIDER",
            ErrorCode::MalformedInput => "MALFORMED_INPUT",
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::RemoteError => "REMOTE_ERROR",
            ErrorCode::StreamError => "STREAM_ERROR",
            ErrorCode::RequestTimeout => "REQUEST_TIMEOUT",
            ErrorCode::Interrupted => "INTERRUPTED",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Protocol event: wire shape of one output line.
///
/// The `type` key is written first, then the variant's fields in declaration order.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BridgeEvent {
    Ready {
        message: String,
    },
    Pong,
    Chunk {
        #[serde(flatten)]
        chunk: ChunkData,
    },
    End {
        success: bool,
        content: String,
        tool_calls: Option<Vec<ToolCallRecord>>,
        finish_reason: String,
        token_usage: TokenUsage,
    },
    Error {
        message: String,
        traceback: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        error_code: Option<ErrorCode>,
    },
}

impl BridgeEvent {
    /// Serializes this event to a JSON object.
    pub fn to_value(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    /// True for `end` and `error`, the events that close one request.
    pub fn is_terminal(&self) -> bool {
        matches!(self, BridgeEvent::End { .. } | BridgeEvent::Error { .. })
    }
}
