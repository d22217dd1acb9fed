//! Vendor credentials and the services built from them.

use std::sync::Arc;
use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use redraft_core::ProviderRegistry;
use redraft_core::detect::AiDetector;
use redraft_core::transcribe::Transcriber;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{
    AnthropicProvider, GptZeroDetector, OpenAiCompatibleProvider, ReqwestClient, ReqwestConfig,
    Result, TRACING_TARGET, WhisperTranscriber,
};

/// Default values for configuration options.
mod defaults {
    /// Default provider request timeout in seconds.
    pub const PROVIDER_TIMEOUT_SECS: u64 = 120;

    /// Default transcription timeout in seconds.
    pub const TRANSCRIBE_TIMEOUT_SECS: u64 = 30;

    pub fn provider_timeout_secs() -> u64 {
        PROVIDER_TIMEOUT_SECS
    }

    pub fn transcribe_timeout_secs() -> u64 {
        TRANSCRIBE_TIMEOUT_SECS
    }
}

/// API keys, model overrides and timeouts of the hosted services.
///
/// A missing key leaves the corresponding service unconfigured.
#[derive(Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct ProviderConfig {
    /// OpenAI API key, also used for Whisper transcription.
    #[cfg_attr(
        feature = "config",
        arg(long = "openai-api-key", env = "OPENAI_API_KEY", hide_env_values = true)
    )]
    #[serde(default)]
    pub openai_api_key: Option<String>,

    /// OpenAI model override.
    #[cfg_attr(feature = "config", arg(long = "openai-model", env = "OPENAI_MODEL"))]
    #[serde(default)]
    pub openai_model: Option<String>,

    /// OpenAI base URL override, for proxies and compatible gateways.
    #[cfg_attr(feature = "config", arg(long = "openai-base-url", env = "OPENAI_BASE_URL"))]
    #[serde(default)]
    pub openai_base_url: Option<Url>,

    /// Anthropic API key.
    #[cfg_attr(
        feature = "config",
        arg(long = "anthropic-api-key", env = "ANTHROPIC_API_KEY", hide_env_values = true)
    )]
    #[serde(default)]
    pub anthropic_api_key: Option<String>,

    /// Anthropic model override.
    #[cfg_attr(feature = "config", arg(long = "anthropic-model", env = "ANTHROPIC_MODEL"))]
    #[serde(default)]
    pub anthropic_model: Option<String>,

    /// DeepSeek API key.
    #[cfg_attr(
        feature = "config",
        arg(long = "deepseek-api-key", env = "DEEPSEEK_API_KEY", hide_env_values = true)
    )]
    #[serde(default)]
    pub deepseek_api_key: Option<String>,

    /// DeepSeek model override.
    #[cfg_attr(feature = "config", arg(long = "deepseek-model", env = "DEEPSEEK_MODEL"))]
    #[serde(default)]
    pub deepseek_model: Option<String>,

    /// Perplexity API key.
    #[cfg_attr(
        feature = "config",
        arg(long = "perplexity-api-key", env = "PERPLEXITY_API_KEY", hide_env_values = true)
    )]
    #[serde(default)]
    pub perplexity_api_key: Option<String>,

    /// Perplexity model override.
    #[cfg_attr(feature = "config", arg(long = "perplexity-model", env = "PERPLEXITY_MODEL"))]
    #[serde(default)]
    pub perplexity_model: Option<String>,

    /// GPTZero API key.
    #[cfg_attr(
        feature = "config",
        arg(long = "gptzero-api-key", env = "GPTZERO_API_KEY", hide_env_values = true)
    )]
    #[serde(default)]
    pub gptzero_api_key: Option<String>,

    /// Timeout of a single provider request in seconds.
    #[cfg_attr(
        feature = "config",
        arg(long = "provider-timeout-secs", env = "PROVIDER_TIMEOUT_SECS", default_value = "120")
    )]
    #[serde(default = "defaults::provider_timeout_secs")]
    pub provider_timeout_secs: u64,

    /// Timeout of a transcription request in seconds.
    #[cfg_attr(
        feature = "config",
        arg(
            long = "transcribe-timeout-secs",
            env = "TRANSCRIBE_TIMEOUT_SECS",
            default_value = "30"
        )
    )]
    #[serde(default = "defaults::transcribe_timeout_secs")]
    pub transcribe_timeout_secs: u64,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let configured = |key: &Option<String>| key.as_deref().is_some_and(|k| !k.is_empty());

        f.debug_struct("ProviderConfig")
            .field("openai", &configured(&self.openai_api_key))
            .field("openai_model", &self.openai_model)
            .field("openai_base_url", &self.openai_base_url.as_ref().map(Url::as_str))
            .field("anthropic", &configured(&self.anthropic_api_key))
            .field("anthropic_model", &self.anthropic_model)
            .field("deepseek", &configured(&self.deepseek_api_key))
            .field("deepseek_model", &self.deepseek_model)
            .field("perplexity", &configured(&self.perplexity_api_key))
            .field("perplexity_model", &self.perplexity_model)
            .field("gptzero", &configured(&self.gptzero_api_key))
            .field("provider_timeout_secs", &self.provider_timeout_secs)
            .field("transcribe_timeout_secs", &self.transcribe_timeout_secs)
            .finish()
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            openai_model: None,
            openai_base_url: None,
            anthropic_api_key: None,
            anthropic_model: None,
            deepseek_api_key: None,
            deepseek_model: None,
            perplexity_api_key: None,
            perplexity_model: None,
            gptzero_api_key: None,
            provider_timeout_secs: defaults::PROVIDER_TIMEOUT_SECS,
            transcribe_timeout_secs: defaults::TRANSCRIBE_TIMEOUT_SECS,
        }
    }
}

/// Returns the key if it is set and not blank.
fn key(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|key| !key.is_empty())
}

impl ProviderConfig {
    /// Returns the provider request timeout.
    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider_timeout_secs)
    }

    /// Returns the transcription timeout.
    pub fn transcribe_timeout(&self) -> Duration {
        Duration::from_secs(self.transcribe_timeout_secs)
    }

    /// Creates the HTTP client shared by every adapter.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn connect(&self) -> Result<ReqwestClient> {
        ReqwestClient::new(ReqwestConfig::default().with_timeout(self.provider_timeout()))
    }

    /// Registers an adapter for every provider with an API key.
    pub fn build_registry(&self, client: &ReqwestClient) -> ProviderRegistry {
        let mut registry = ProviderRegistry::new();

        if let Some(api_key) = key(&self.openai_api_key) {
            let mut provider = OpenAiCompatibleProvider::openai(client.clone(), api_key);
            if let Some(base_url) = &self.openai_base_url {
                provider = provider.with_base_url(base_url.as_str());
            }
            if let Some(model) = key(&self.openai_model) {
                provider = provider.with_model(model);
            }
            registry = registry.with_provider(provider);
        }

        if let Some(api_key) = key(&self.anthropic_api_key) {
            let mut provider = AnthropicProvider::new(client.clone(), api_key);
            if let Some(model) = key(&self.anthropic_model) {
                provider = provider.with_model(model);
            }
            registry = registry.with_provider(provider);
        }

        if let Some(api_key) = key(&self.deepseek_api_key) {
            let mut provider = OpenAiCompatibleProvider::deepseek(client.clone(), api_key);
            if let Some(model) = key(&self.deepseek_model) {
                provider = provider.with_model(model);
            }
            registry = registry.with_provider(provider);
        }

        if let Some(api_key) = key(&self.perplexity_api_key) {
            let mut provider = OpenAiCompatibleProvider::perplexity(client.clone(), api_key);
            if let Some(model) = key(&self.perplexity_model) {
                provider = provider.with_model(model);
            }
            registry = registry.with_provider(provider);
        }

        if registry.is_empty() {
            tracing::warn!(
                target: TRACING_TARGET,
                "No language model provider is configured"
            );
        } else {
            tracing::info!(
                target: TRACING_TARGET,
                providers = ?registry.available(),
                "Language model providers configured"
            );
        }

        registry
    }

    /// Creates the GPTZero detector if its key is set.
    pub fn build_detector(&self, client: &ReqwestClient) -> Option<Arc<dyn AiDetector>> {
        let api_key = key(&self.gptzero_api_key)?;
        Some(Arc::new(GptZeroDetector::new(client.clone(), api_key)))
    }

    /// Creates the Whisper transcriber if the OpenAI key is set.
    pub fn build_transcriber(&self, client: &ReqwestClient) -> Option<Arc<dyn Transcriber>> {
        let api_key = key(&self.openai_api_key)?;
        let transcriber =
            WhisperTranscriber::new(client.clone(), api_key).with_timeout(self.transcribe_timeout());
        Some(Arc::new(transcriber))
    }
}
