//! Input side of the protocol: one line is a control command or a JSON request.

use serde::Deserialize;
use serde_json::Value;

/// Literal liveness probe.
pub const PING: &str = "PING";
/// Literal shutdown command.
pub const EXIT: &str = "EXIT";

/// Inbound chat-completion request, exactly as the host sent it.
///
/// Every field is optional on the wire and `null` counts as absent; defaults and
/// validation are applied by [`normalize`](crate::normalize::normalize). Message,
/// tool and option payloads are opaque and forwarded untouched.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct Request {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub messages: Option<Vec<Value>>,
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
    pub top_p: Option<f64>,
    pub tools: Option<Vec<Value>>,
    /// `"auto"`, `"none"`, `"required"` or a provider-specific object.
    pub tool_choice: Option<Value>,
    pub parallel_tool_calls: Option<bool>,
    /// Provider-specific options blob.
    pub web_search_options: Option<Value>,
    pub stream: Option<bool>,
}

/// One decoded input line.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    Ping,
    Exit,
    Request(Box<Request>),
}

impl Command {
    /// Decodes one input line. Surrounding whitespace (including `\r`) is ignored.
    ///
    /// Returns `Ok(None)` for a blank line. Anything that is not a literal command
    /// must be a JSON object; arrays, scalars and type mismatches are errors.
    pub fn parse(line: &str) -> Result<Option<Command>, serde_json::Error> {
        let line = line.trim();
        match line {
            "" => Ok(None),
            PING => Ok(Some(Command::Ping)),
            EXIT => Ok(Some(Command::Exit)),
            _ => {
                let object: serde_json::Map<String, Value> = serde_json::from_str(line)?;
                let request: Request = serde_json::from_value(Value::Object(object))?;
                Ok(Some(Command::Request(Box::new(request))))
            }
        }
    }
}
