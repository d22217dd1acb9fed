//! OpenAI-compatible chat completions.
//!
//! OpenAI, DeepSeek and Perplexity share the `chat/completions` wire format
//! and differ only in endpoint and default model.

use redraft_core::provider::{
    CompletionRequest, CompletionResponse, LanguageProvider, ProviderKind, TokenUsage,
};
use serde::{Deserialize, Serialize};

use super::TRACING_TARGET;
use crate::ReqwestClient;
use crate::error::Error;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

/// Adapter for OpenAI-compatible chat completion APIs.
#[derive(Clone)]
pub struct OpenAiCompatibleProvider {
    kind: ProviderKind,
    client: ReqwestClient,
    endpoint: String,
    api_key: String,
    model: String,
}

impl std::fmt::Debug for OpenAiCompatibleProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiCompatibleProvider")
            .field("kind", &self.kind)
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl OpenAiCompatibleProvider {
    /// Default OpenAI base URL.
    pub const OPENAI_BASE_URL: &'static str = "https://api.openai.com/v1";
    /// Default DeepSeek base URL.
    pub const DEEPSEEK_BASE_URL: &'static str = "https://api.deepseek.com/v1";
    /// Default Perplexity base URL.
    pub const PERPLEXITY_BASE_URL: &'static str = "https://api.perplexity.ai";

    /// Creates an OpenAI adapter.
    pub fn openai(client: ReqwestClient, api_key: impl Into<String>) -> Self {
        Self::new(
            ProviderKind::OpenAi,
            client,
            Self::OPENAI_BASE_URL,
            api_key,
            "gpt-4o",
        )
    }

    /// Creates a DeepSeek adapter.
    pub fn deepseek(client: ReqwestClient, api_key: impl Into<String>) -> Self {
        Self::new(
            ProviderKind::DeepSeek,
            client,
            Self::DEEPSEEK_BASE_URL,
            api_key,
            "deepseek-chat",
        )
    }

    /// Creates a Perplexity adapter.
    pub fn perplexity(client: ReqwestClient, api_key: impl Into<String>) -> Self {
        Self::new(
            ProviderKind::Perplexity,
            client,
            Self::PERPLEXITY_BASE_URL,
            api_key,
            "sonar-pro",
        )
    }

    fn new(
        kind: ProviderKind,
        client: ReqwestClient,
        base_url: &str,
        api_key: impl Into<String>,
        model: &str,
    ) -> Self {
        Self {
            kind,
            client,
            endpoint: completions_endpoint(base_url),
            api_key: api_key.into(),
            model: model.to_owned(),
        }
    }

    /// Overrides the model.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Overrides the base URL, e.g. for a proxy.
    #[must_use]
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.endpoint = completions_endpoint(base_url);
        self
    }

    fn build_request<'a>(&'a self, request: &'a CompletionRequest) -> ChatRequest<'a> {
        let system = request.system.as_deref().map(|content| ChatMessage {
            role: "system",
            content,
        });
        let turns = request.messages.iter().map(|message| ChatMessage {
            role: message.role.as_str(),
            content: &message.content,
        });

        ChatRequest {
            model: &self.model,
            messages: system.into_iter().chain(turns).collect(),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        }
    }
}

fn completions_endpoint(base_url: &str) -> String {
    format!("{}/chat/completions", base_url.trim_end_matches('/'))
}

fn into_completion(response: ChatResponse) -> Result<CompletionResponse, Error> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| Error::Response("response has no choices".to_owned()))?;

    // `length` means generation stopped at `max_tokens`.
    if choice.finish_reason.as_deref() == Some("length") {
        return Err(Error::Truncated);
    }

    let content = choice
        .message
        .content
        .ok_or_else(|| Error::Response("response has no message content".to_owned()))?;

    let mut completion = CompletionResponse::new(content);
    if let Some(model) = response.model {
        completion = completion.with_model(model);
    }
    if let Some(usage) = response.usage {
        completion = completion.with_usage(TokenUsage {
            input_tokens: usage.prompt_tokens,
            output_tokens: usage.completion_tokens,
        });
    }
    Ok(completion)
}

#[async_trait::async_trait]
impl LanguageProvider for OpenAiCompatibleProvider {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: &CompletionRequest) -> redraft_core::Result<CompletionResponse> {
        let body = self.build_request(request);

        tracing::trace!(
            target: TRACING_TARGET,
            provider = %self.kind,
            endpoint = %self.endpoint,
            messages = body.messages.len(),
            "Sending chat completion"
        );

        let http_request = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key);

        let response: ChatResponse = self
            .client
            .send_json(http_request, &body)
            .await
            .map_err(|error| redraft_core::Error::from(error).with_provider(self.kind))?;

        into_completion(response)
            .map_err(|error| redraft_core::Error::from(error).with_provider(self.kind))
    }
}

#[cfg(test)]
mod tests {
    use redraft_core::provider::ChatMessage as CoreMessage;

    use super::*;
    use crate::ReqwestConfig;

    fn provider() -> anyhow::Result<OpenAiCompatibleProvider> {
        let client = ReqwestClient::new(ReqwestConfig::default())?;
        Ok(OpenAiCompatibleProvider::deepseek(client, "sk-test"))
    }

    #[test]
    fn system_prompt_becomes_first_message() -> anyhow::Result<()> {
        let provider = provider()?;
        let request = CompletionRequest {
            system: Some("Be formal.".to_owned()),
            messages: vec![CoreMessage::user("hey"), CoreMessage::assistant("Hello.")],
            max_tokens: Some(128),
            temperature: None,
        };

        let json = serde_json::to_value(provider.build_request(&request))?;
        assert_eq!(json["model"], "deepseek-chat");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "hey");
        assert_eq!(json["messages"][2]["role"], "assistant");
        assert_eq!(json["max_tokens"], 128);
        assert!(json.get("temperature").is_none());
        Ok(())
    }

    #[test]
    fn endpoints_follow_base_url() -> anyhow::Result<()> {
        let provider = provider()?;
        assert_eq!(provider.endpoint, "https://api.deepseek.com/v1/chat/completions");

        let provider = provider.with_base_url("http://localhost:8080/v1/");
        assert_eq!(provider.endpoint, "http://localhost:8080/v1/chat/completions");
        Ok(())
    }

    #[test]
    fn parses_first_choice() -> anyhow::Result<()> {
        let response: ChatResponse = serde_json::from_str(
            r#"{
                "model": "gpt-4o-2024-08-06",
                "choices": [{
                    "index": 0,
                    "message": {"role": "assistant", "content": "Done."},
                    "finish_reason": "stop"
                }],
                "usage": {"prompt_tokens": 12, "completion_tokens": 3, "total_tokens": 15}
            }"#,
        )?;

        let completion = into_completion(response)?;
        assert_eq!(completion.content, "Done.");
        assert_eq!(completion.model.as_deref(), Some("gpt-4o-2024-08-06"));
        assert_eq!(completion.usage.map(|u| u.output_tokens), Some(3));
        Ok(())
    }

    #[test]
    fn empty_choices_are_rejected() -> anyhow::Result<()> {
        let response: ChatResponse = serde_json::from_str(r#"{"choices": []}"#)?;
        assert!(matches!(into_completion(response), Err(Error::Response(_))));
        Ok(())
    }

    #[test]
    fn length_finish_reason_is_an_error() -> anyhow::Result<()> {
        let response: ChatResponse = serde_json::from_str(
            r#"{
                "choices": [{
                    "index": 0,
                    "message": {"role": "assistant", "content": "The first half of the"},
                    "finish_reason": "length"
                }],
                "usage": {"prompt_tokens": 5000, "completion_tokens": 4096}
            }"#,
        )?;

        let error = into_completion(response).err();
        assert!(matches!(error, Some(Error::Truncated)));

        let error = redraft_core::Error::from(Error::Truncated);
        assert_eq!(error.kind, redraft_core::ErrorKind::ExternalError);
        assert!(error.to_string().contains("output token limit"));
        Ok(())
    }
}
