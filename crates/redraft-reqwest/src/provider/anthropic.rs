//! Anthropic messages API.

use redraft_core::provider::{
    CompletionRequest, CompletionResponse, LanguageProvider, ProviderKind, TokenUsage,
};
use serde::{Deserialize, Serialize};

use super::TRACING_TARGET;
use crate::ReqwestClient;
use crate::error::Error;

const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: Vec<Message<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    content: Vec<ContentBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    input_tokens: u32,
    #[serde(default)]
    output_tokens: u32,
}

/// Adapter for the Anthropic messages API.
#[derive(Clone)]
pub struct AnthropicProvider {
    client: ReqwestClient,
    endpoint: String,
    api_key: String,
    model: String,
}

impl std::fmt::Debug for AnthropicProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicProvider")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl AnthropicProvider {
    /// Default messages endpoint.
    pub const ENDPOINT: &'static str = "https://api.anthropic.com/v1/messages";
    /// Default model.
    pub const DEFAULT_MODEL: &'static str = "claude-sonnet-4-20250514";

    /// Creates an adapter with the default endpoint and model.
    pub fn new(client: ReqwestClient, api_key: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: Self::ENDPOINT.to_owned(),
            api_key: api_key.into(),
            model: Self::DEFAULT_MODEL.to_owned(),
        }
    }

    /// Overrides the model.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    fn build_request<'a>(&'a self, request: &'a CompletionRequest) -> MessagesRequest<'a> {
        let max_tokens = request
            .max_tokens
            .unwrap_or(self.limits().max_output_tokens);

        MessagesRequest {
            model: &self.model,
            max_tokens,
            system: request.system.as_deref(),
            messages: request
                .messages
                .iter()
                .map(|message| Message {
                    role: message.role.as_str(),
                    content: &message.content,
                })
                .collect(),
            temperature: request.temperature,
        }
    }
}

fn into_completion(response: MessagesResponse) -> Result<CompletionResponse, Error> {
    if response.stop_reason.as_deref() == Some("max_tokens") {
        return Err(Error::Truncated);
    }

    let text: Vec<String> = response
        .content
        .into_iter()
        .filter(|block| block.kind == "text")
        .filter_map(|block| block.text)
        .collect();

    if text.is_empty() {
        return Err(Error::Response("response has no text content".to_owned()));
    }

    let mut completion = CompletionResponse::new(text.join("\n"));
    if let Some(model) = response.model {
        completion = completion.with_model(model);
    }
    if let Some(usage) = response.usage {
        completion = completion.with_usage(TokenUsage {
            input_tokens: usage.input_tokens,
            output_tokens: usage.output_tokens,
        });
    }
    Ok(completion)
}

#[async_trait::async_trait]
impl LanguageProvider for AnthropicProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Anthropic
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: &CompletionRequest) -> redraft_core::Result<CompletionResponse> {
        let body = self.build_request(request);

        tracing::trace!(
            target: TRACING_TARGET,
            provider = %ProviderKind::Anthropic,
            messages = body.messages.len(),
            max_tokens = body.max_tokens,
            "Sending messages request"
        );

        let http_request = self
            .client
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION);

        let response: MessagesResponse = self
            .client
            .send_json(http_request, &body)
            .await
            .map_err(|error| redraft_core::Error::from(error).with_provider(ProviderKind::Anthropic))?;

        into_completion(response)
            .map_err(|error| redraft_core::Error::from(error).with_provider(ProviderKind::Anthropic))
    }
}
