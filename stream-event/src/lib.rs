//! Bridge output protocol: one tagged JSON object per line.
//!
//! This crate defines the wire shape of every event the bridge writes to its output
//! channel. It does not depend on the engine; `bridge` builds [`BridgeEvent`]s and
//! writes them with [`to_line`].

pub mod event;
pub mod line;

pub use event::{
    BridgeEvent, ChunkData, ErrorCode, FunctionCall, TokenUsage, ToolCallProgress,
    ToolCallRecord,
};
pub use line::to_line;
