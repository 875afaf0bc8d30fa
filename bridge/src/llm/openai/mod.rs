//! OpenAI Chat Completions backend.
//!
//! Sends [`ChatParams`] as the request body unchanged through `async-openai`'s
//! bring-your-own-types calls, so opaque fields (messages, tools, provider options)
//! reach the API exactly as the host wrote them. Responses decode into the lenient
//! DTOs in [`wire`].
//!
//! Streaming requests always ask for `stream_options.include_usage`; the final usage
//! chunk is what lets the accumulator finish without waiting for the connection to close.

mod wire;

use async_openai::{config::OpenAIConfig, Client};
use async_trait::async_trait;
use futures::StreamExt;
use serde::Serialize;
use tracing::{debug, trace};

use crate::llm::{BackendError, ChatBackend, ClientFactory, Completion, DeltaStream};
use crate::normalize::ChatParams;

#[derive(Serialize)]
struct StreamOptions {
    include_usage: bool,
}

/// Streaming body: the normalized params plus `stream_options`.
#[derive(Serialize)]
struct StreamBody<'a> {
    #[serde(flatten)]
    params: &'a ChatParams,
    stream_options: StreamOptions,
}

/// One `async-openai` client bound to a credential and base URL.
pub struct OpenAiBackend {
    client: Client<OpenAIConfig>,
    api_base: String,
}

impl OpenAiBackend {
    pub fn new(config: OpenAIConfig) -> Self {
        let api_base = async_openai::config::Config::api_base(&config).to_string();
        Self {
            client: Client::with_config(config),
            api_base,
        }
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    fn log_request(&self, params: &ChatParams) {
        debug!(
            url = %self.api_base,
            model = %params.model,
            message_count = params.messages.len(),
            tools_count = params.tools.as_ref().map(Vec::len).unwrap_or(0),
            stream = params.stream,
            "OpenAI chat create"
        );
        if let Ok(js) = serde_json::to_string(params) {
            trace!(url = %self.api_base, request = %js, "OpenAI request body");
        }
    }
}

#[async_trait]
impl ChatBackend for OpenAiBackend {
    async fn complete(&self, params: &ChatParams) -> Result<Completion, BackendError> {
        self.log_request(params);
        let response: wire::ChatCompletionResponse =
            self.client.chat().create_byot(params).await?;
        trace!(url = %self.api_base, response = ?response, "OpenAI response");
        response.into_completion()
    }

    async fn stream(&self, params: &ChatParams) -> Result<DeltaStream, BackendError> {
        self.log_request(params);
        let body = StreamBody {
            params,
            stream_options: StreamOptions {
                include_usage: true,
            },
        };
        let stream = self
            .client
            .chat()
            .create_stream_byot::<_, wire::ChatCompletionChunk>(body)
            .await?;
        Ok(stream
            .map(|item| {
                item.map(wire::ChatCompletionChunk::into_delta)
                    .map_err(BackendError::from)
            })
            .boxed())
    }
}

/// Builds [`OpenAiBackend`]s. Requests without an endpoint use `default_base_url`
/// when set, else the `async-openai` default (`https://api.openai.com/v1`).
#[derive(Clone, Debug, Default)]
pub struct OpenAiFactory {
    default_base_url: Option<String>,
}

impl OpenAiFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default_base_url(mut self, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        self.default_base_url = (!base_url.trim().is_empty()).then_some(base_url);
        self
    }
}

impl ClientFactory for OpenAiFactory {
    type Client = OpenAiBackend;

    fn provider_name(&self) -> &str {
        "OpenAI"
    }

    fn create(&self, credential: &str, endpoint: Option<&str>) -> OpenAiBackend {
        let mut config = OpenAIConfig::new().with_api_key(credential);
        if let Some(base) = endpoint.or(self.default_base_url.as_deref()) {
            config = config.with_api_base(base);
        }
        OpenAiBackend::new(config)
    }
}
