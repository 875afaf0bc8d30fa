//! Request Normalizer: validates a [`Request`] and maps it into the canonical
//! parameter set the backend sends, applying defaults and omitting absent options.

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::request::Request;

const DEFAULT_TEMPERATURE: f64 = 0.7;
const DEFAULT_TOOL_CHOICE: &str = "auto";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("API key is required")]
    MissingCredential,
    #[error("model is required")]
    MissingModel,
}

/// Where a request goes: credential plus optional endpoint override.
///
/// Kept apart from [`ChatParams`] so the credential never ends up in a request body
/// or a log line that prints parameters.
#[derive(Clone, PartialEq, Eq)]
pub struct Target {
    pub credential: String,
    pub endpoint: Option<String>,
}

impl std::fmt::Debug for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Target")
            .field("credential", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

/// Canonical Chat Completions parameters; serializes to the provider JSON body.
///
/// `None` fields are omitted from the body entirely so provider defaults apply.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChatParams {
    pub model: String,
    pub messages: Vec<Value>,
    pub temperature: f64,
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallel_tool_calls: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub web_search_options: Option<Value>,
}

/// Output of [`normalize`].
#[derive(Clone, Debug, PartialEq)]
pub struct Normalized {
    pub target: Target,
    pub params: ChatParams,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

/// Validates and normalizes one request.
///
/// - credential and model must be present and non-empty (credential checked first);
/// - defaults: temperature 0.7, stream true, tool_choice `"auto"`, parallel tool calls on;
/// - `max_tokens` / `top_p` are kept only when non-zero;
/// - `tools`, `tool_choice`, `parallel_tool_calls` are sent only with a non-empty tool list;
/// - `web_search_options` is forwarded as-is when present.
pub fn normalize(request: Request) -> Result<Normalized, ValidationError> {
    let credential = non_empty(request.api_key).ok_or(ValidationError::MissingCredential)?;
    let model = non_empty(request.model).ok_or(ValidationError::MissingModel)?;

    let tools = request.tools.filter(|t| !t.is_empty());
    let (tool_choice, parallel_tool_calls) = if tools.is_some() {
        (
            Some(
                request
                    .tool_choice
                    .unwrap_or_else(|| Value::String(DEFAULT_TOOL_CHOICE.to_string())),
            ),
            Some(request.parallel_tool_calls.unwrap_or(true)),
        )
    } else {
        (None, None)
    };

    let params = ChatParams {
        model,
        messages: request.messages.unwrap_or_default(),
        temperature: request.temperature.unwrap_or(DEFAULT_TEMPERATURE),
        stream: request.stream.unwrap_or(true),
        max_tokens: request.max_tokens.filter(|&n| n != 0),
        top_p: request.top_p.filter(|&p| p != 0.0),
        tools,
        tool_choice,
        parallel_tool_calls,
        web_search_options: request.web_search_options,
    };

    Ok(Normalized {
        target: Target {
            credential,
            endpoint: request.base_url,
        },
        params,
    })
}
