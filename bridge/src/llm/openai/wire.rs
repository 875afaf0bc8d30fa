//! Response DTOs for OpenAI-compatible Chat Completions, decoded leniently.
//!
//! Only the fields the bridge reads are modelled; everything else is ignored so
//! OpenAI-compatible proxies with extra or missing keys still decode.

use serde::Deserialize;
use stream_event::{FunctionCall, TokenUsage, ToolCallRecord};

use crate::llm::{BackendError, Completion, Delta, ToolCallFragment};

#[derive(Debug, Default, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
    #[serde(default)]
    pub total_tokens: u32,
}

impl From<Usage> for TokenUsage {
    fn from(u: Usage) -> Self {
        TokenUsage::new(u.prompt_tokens, u.completion_tokens, u.total_tokens)
    }
}

// ---------------------------------------------------------------------------
// Non-streaming
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ResponseMessage,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ResponseMessage {
    pub content: Option<String>,
    pub tool_calls: Option<Vec<ToolCall>>,
}

#[derive(Debug, Deserialize)]
pub struct ToolCall {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub function: Function,
}

#[derive(Debug, Deserialize)]
pub struct Function {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub arguments: String,
}

impl ChatCompletionResponse {
    /// Maps the first choice into a [`Completion`].
    pub fn into_completion(self) -> Result<Completion, BackendError> {
        let choice = self
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| BackendError::InvalidResponse("no choices in response".to_string()))?;
        let tool_calls = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|tc| ToolCallRecord {
                id: tc.id,
                kind: tc.kind.unwrap_or_else(|| "function".to_string()),
                function: FunctionCall {
                    name: tc.function.name,
                    arguments: tc.function.arguments,
                },
            })
            .collect();
        Ok(Completion {
            content: choice.message.content,
            tool_calls,
            finish_reason: choice.finish_reason,
            usage: self.usage.map(TokenUsage::from),
        })
    }
}

// ---------------------------------------------------------------------------
// Streaming
// ---------------------------------------------------------------------------

/// One `chat.completion.chunk`. With `stream_options.include_usage` the last chunk
/// carries `usage` and usually an empty `choices` array.
#[derive(Debug, Deserialize)]
pub struct ChatCompletionChunk {
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub struct ChunkChoice {
    #[serde(default)]
    pub delta: ChunkDelta,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChunkDelta {
    pub content: Option<String>,
    pub tool_calls: Option<Vec<ToolCallChunk>>,
}

#[derive(Debug, Deserialize)]
pub struct ToolCallChunk {
    pub index: u32,
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub function: Option<FunctionChunk>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FunctionChunk {
    pub name: Option<String>,
    pub arguments: Option<String>,
}

impl ChatCompletionChunk {
    /// Maps the chunk into a [`Delta`], reading only `choices[0]`. Usage is read
    /// even when `choices` is empty.
    pub fn into_delta(self) -> Delta {
        let usage = self.usage.map(TokenUsage::from);
        let Some(choice) = self.choices.into_iter().next() else {
            return Delta {
                usage,
                ..Default::default()
            };
        };
        let tool_calls = choice
            .delta
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|tc| {
                let function = tc.function.unwrap_or_default();
                ToolCallFragment {
                    index: tc.index,
                    id: tc.id,
                    kind: tc.kind,
                    name: function.name,
                    arguments: function.arguments,
                }
            })
            .collect();
        Delta {
            content: choice.delta.content,
            tool_calls,
            finish_reason: choice.finish_reason,
            usage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn completion_maps_first_choice_and_usage() {
        let response: ChatCompletionResponse = serde_json::from_value(json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "hello"},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 2, "completion_tokens": 1, "total_tokens": 3}
        }))
        .unwrap();

        let completion = response.into_completion().unwrap();

        assert_eq!(completion.content.as_deref(), Some("hello"));
        assert!(completion.tool_calls.is_empty());
        assert_eq!(completion.finish_reason.as_deref(), Some("stop"));
        assert_eq!(completion.usage, Some(TokenUsage::new(2, 1, 3)));
    }

    #[test]
    fn completion_maps_tool_calls() {
        let response: ChatCompletionResponse = serde_json::from_value(json!({
            "choices": [{
                "message": {
                    "content": null,
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": {"name": "get_time", "arguments": "{}"}
                    }]
                },
                "finish_reason": "tool_calls"
            }]
        }))
        .unwrap();

        let completion = response.into_completion().unwrap();

        assert!(completion.content.is_none());
        assert_eq!(completion.tool_calls.len(), 1);
        assert_eq!(completion.tool_calls[0].id, "call_1");
        assert_eq!(completion.tool_calls[0].function.name, "get_time");
        assert!(completion.usage.is_none());
    }

    #[test]
    fn completion_without_choices_is_invalid() {
        let response: ChatCompletionResponse =
            serde_json::from_value(json!({"choices": []})).unwrap();
        assert!(matches!(
            response.into_completion(),
            Err(BackendError::InvalidResponse(_))
        ));
    }

    #[test]
    fn chunk_maps_content_and_tool_call_fragments() {
        let chunk: ChatCompletionChunk = serde_json::from_value(json!({
            "object": "chat.completion.chunk",
            "choices": [{
                "index": 0,
                "delta": {
                    "content": "hi",
                    "tool_calls": [{
                        "index": 1,
                        "id": "call_2",
                        "type": "function",
                        "function": {"name": "f", "arguments": "{\"a\""}
                    }]
                },
                "finish_reason": null
            }]
        }))
        .unwrap();

        let delta = chunk.into_delta();

        assert_eq!(delta.content.as_deref(), Some("hi"));
        assert_eq!(
            delta.tool_calls,
            vec![ToolCallFragment {
                index: 1,
                id: Some("call_2".into()),
                kind: Some("function".into()),
                name: Some("f".into()),
                arguments: Some("{\"a\"".into()),
            }]
        );
        assert!(delta.finish_reason.is_none());
        assert!(delta.usage.is_none());
    }

    #[test]
    fn usage_chunk_with_empty_choices_keeps_usage() {
        let chunk: ChatCompletionChunk = serde_json::from_value(json!({
            "choices": [],
            "usage": {"prompt_tokens": 5, "completion_tokens": 3, "total_tokens": 8}
        }))
        .unwrap();

        let delta = chunk.into_delta();

        assert_eq!(delta.usage, Some(TokenUsage::new(5, 3, 8)));
        assert!(delta.content.is_none());
    }

    #[test]
    fn fragment_without_function_object_has_no_name_or_arguments() {
        let chunk: ChatCompletionChunk = serde_json::from_value(json!({
            "choices": [{"delta": {"tool_calls": [{"index": 0, "id": "c"}]}}]
        }))
        .unwrap();

        let delta = chunk.into_delta();

        assert_eq!(delta.tool_calls[0].id.as_deref(), Some("c"));
        assert!(delta.tool_calls[0].name.is_none());
        assert!(delta.tool_calls[0].arguments.is_none());
    }
}
