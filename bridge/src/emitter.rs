//! Event Emitter: writes one [`BridgeEvent`] per line and flushes after every event.

use std::io::{self, Write};

use stream_event::{to_line, BridgeEvent, ChunkData, ErrorCode, ToolCallProgress};

use crate::accumulator::FinalResponse;
use crate::error::{diagnostic_trace, BridgeError};

/// Line writer for the output channel.
///
/// Nothing is buffered across events: each call writes a full line and flushes,
/// so the host sees it immediately.
pub struct Emitter<W: Write> {
    out: W,
    emitted: u64,
}

impl<W: Write> Emitter<W> {
    pub fn new(out: W) -> Self {
        Self { out, emitted: 0 }
    }

    /// Number of events written so far.
    pub fn emitted(&self) -> u64 {
        self.emitted
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn emit(&mut self, event: &BridgeEvent) -> io::Result<()> {
        let line = to_line(event).map_err(io::Error::from)?;
        self.out.write_all(line.as_bytes())?;
        self.out.flush()?;
        self.emitted += 1;
        Ok(())
    }

    pub fn ready(&mut self, message: impl Into<String>) -> io::Result<()> {
        self.emit(&BridgeEvent::Ready {
            message: message.into(),
        })
    }

    pub fn pong(&mut self) -> io::Result<()> {
        self.emit(&BridgeEvent::Pong)
    }

    pub fn content_chunk(&mut self, fragment: &str) -> io::Result<()> {
        self.emit(&BridgeEvent::Chunk {
            chunk: ChunkData::Content(fragment.to_string()),
        })
    }

    pub fn tool_call_progress(&mut self, progress: ToolCallProgress) -> io::Result<()> {
        self.emit(&BridgeEvent::Chunk {
            chunk: ChunkData::ToolCallProgress(progress),
        })
    }

    /// Terminal success for one request.
    pub fn end(&mut self, response: FinalResponse) -> io::Result<()> {
        self.emit(&response.into_event())
    }

    pub fn error(
        &mut self,
        message: impl Into<String>,
        traceback: impl Into<String>,
        error_code: Option<ErrorCode>,
    ) -> io::Result<()> {
        self.emit(&BridgeEvent::Error {
            message: message.into(),
            traceback: traceback.into(),
            error_code,
        })
    }

    /// Terminal failure for one request: message, source chain and code from `err`.
    pub fn request_error(&mut self, err: &BridgeError) -> io::Result<()> {
        self.error(err.to_string(), diagnostic_trace(err), err.error_code())
    }
}
