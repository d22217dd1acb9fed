use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum::EnumIter;

use super::ProviderLimits;
use crate::{Error, Result};

/// Hosted LLM backends a chunk can be routed to.
///
/// Deserializes from the lowercase provider name and accepts the common
/// `gpt` and `claude` aliases used by older clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[derive(Serialize, Deserialize, EnumIter)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// OpenAI chat completions.
    #[serde(alias = "gpt")]
    OpenAi,
    /// Anthropic messages API.
    #[serde(alias = "claude")]
    Anthropic,
    /// DeepSeek (OpenAI-compatible).
    DeepSeek,
    /// Perplexity (OpenAI-compatible).
    Perplexity,
}

impl ProviderKind {
    /// Returns the wire name of the provider.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
            Self::DeepSeek => "deepseek",
            Self::Perplexity => "perplexity",
        }
    }

    /// Returns the human readable vendor name.
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::OpenAi => "OpenAI",
            Self::Anthropic => "Anthropic",
            Self::DeepSeek => "DeepSeek",
            Self::Perplexity => "Perplexity",
        }
    }

    /// Returns the environment variable holding the provider API key.
    pub const fn api_key_env(self) -> &'static str {
        match self {
            Self::OpenAi => "OPENAI_API_KEY",
            Self::Anthropic => "ANTHROPIC_API_KEY",
            Self::DeepSeek => "DEEPSEEK_API_KEY",
            Self::Perplexity => "PERPLEXITY_API_KEY",
        }
    }

    /// Returns the token limits used when no adapter-specific limits are set.
    pub const fn default_limits(self) -> ProviderLimits {
        match self {
            Self::OpenAi => ProviderLimits {
                max_input_tokens: 120_000,
                max_output_tokens: 4_096,
                fallback_chunk_words: 3_000,
                fallback_delay: Duration::from_secs(3),
            },
            Self::Anthropic => ProviderLimits {
                max_input_tokens: 190_000,
                max_output_tokens: 8_192,
                fallback_chunk_words: 4_000,
                fallback_delay: Duration::from_secs(3),
            },
            Self::DeepSeek => ProviderLimits {
                max_input_tokens: 50_000,
                max_output_tokens: 4_096,
                fallback_chunk_words: 1_500,
                fallback_delay: Duration::from_secs(5),
            },
            Self::Perplexity => ProviderLimits {
                max_input_tokens: 100_000,
                max_output_tokens: 4_096,
                fallback_chunk_words: 2_500,
                fallback_delay: Duration::from_secs(5),
            },
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" | "gpt" => Ok(Self::OpenAi),
            "anthropic" | "claude" => Ok(Self::Anthropic),
            "deepseek" => Ok(Self::DeepSeek),
            "perplexity" => Ok(Self::Perplexity),
            other => Err(Error::invalid_input().with_message(format!(
                "unknown provider '{other}', expected one of: openai, anthropic, deepseek, perplexity"
            ))),
        }
    }
}
