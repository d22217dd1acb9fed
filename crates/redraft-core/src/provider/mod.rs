//! LLM provider abstractions.
//!
//! Every hosted backend implements [`LanguageProvider`]. Adapters are selected
//! through the [`ProviderKind`] tagged enum and looked up in a
//! [`ProviderRegistry`], which hands out [`LanguageService`] wrappers that add
//! structured logging around each completion.
//!
//! # Example
//!
//! ```rust,ignore
//! use redraft_core::provider::{CompletionRequest, ProviderKind, ProviderRegistry};
//!
//! let registry = ProviderRegistry::new().with_provider(my_openai_adapter);
//! let service = registry.get(ProviderKind::OpenAi)?;
//! let response = service
//!     .complete(&CompletionRequest::single("Rewrite formally.", "hey there"))
//!     .await?;
//! ```

mod kind;
mod prompt;
mod registry;
mod request;
mod response;
mod service;

use std::time::Duration;

pub use kind::ProviderKind;
pub use prompt::{PromptTemplate, REWRITE_GUARDRAILS};
pub use registry::ProviderRegistry;
pub use request::{ChatMessage, ChatRole, CompletionRequest, CompletionRequestBuilder};
pub use response::{CompletionResponse, TokenUsage};
pub use service::LanguageService;

pub use crate::{Error, Result};

/// Tracing target for provider operations.
pub const TRACING_TARGET: &str = "redraft_core::provider";

/// Token ceilings and fallback pacing for a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderLimits {
    /// Largest estimated prompt that is sent in a single request.
    pub max_input_tokens: usize,
    /// Upper bound on generated tokens per request.
    pub max_output_tokens: u32,
    /// Chunk size in words used when a prompt exceeds `max_input_tokens`.
    pub fallback_chunk_words: usize,
    /// Pause between fallback requests.
    pub fallback_delay: Duration,
}

impl ProviderLimits {
    /// Returns true if a prompt of `estimated_tokens` fits in one request.
    pub const fn fits(&self, estimated_tokens: usize) -> bool {
        estimated_tokens <= self.max_input_tokens
    }

    /// Largest text, in words, whose rewrite fits in `max_output_tokens`.
    ///
    /// Counts three tokens per two words, matching [`estimate_tokens`] on
    /// typical prose.
    ///
    /// [`estimate_tokens`]: crate::text::estimate_tokens
    pub const fn max_output_words(&self) -> usize {
        tokens_to_words(self.max_output_tokens as usize)
    }

    /// Word size of the pieces a text is split into when it is sent with a
    /// system prompt of `system_tokens`.
    ///
    /// Returns `None` if the system prompt alone exceeds the input ceiling.
    pub fn split_words(&self, system_tokens: usize) -> Option<usize> {
        let room = self.max_input_tokens.checked_sub(system_tokens)?;
        let words = self
            .fallback_chunk_words
            .min(self.max_output_words())
            .min(tokens_to_words(room));
        (words > 0).then_some(words)
    }
}

const fn tokens_to_words(tokens: usize) -> usize {
    tokens * 2 / 3
}

/// A hosted LLM backend.
///
/// Implementations translate a [`CompletionRequest`] into the vendor wire
/// format and map vendor failures into provider-qualified [`Error`]s.
#[async_trait::async_trait]
pub trait LanguageProvider: Send + Sync {
    /// Returns which backend this adapter talks to.
    fn kind(&self) -> ProviderKind;

    /// Returns the token limits of this adapter.
    fn limits(&self) -> ProviderLimits {
        self.kind().default_limits()
    }

    /// Returns the model identifier requests are sent to.
    fn model(&self) -> &str;

    /// Generates a completion for the request.
    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_respects_output_budget() {
        let limits = ProviderKind::OpenAi.default_limits();
        assert_eq!(limits.max_output_words(), 2_730);
        assert_eq!(limits.split_words(1_000), Some(2_730));

        let limits = ProviderKind::DeepSeek.default_limits();
        assert_eq!(limits.split_words(1_000), Some(1_500));
    }

    #[test]
    fn split_shrinks_with_the_system_prompt() {
        let limits = ProviderLimits {
            max_input_tokens: 300,
            max_output_tokens: 4_096,
            fallback_chunk_words: 1_000,
            fallback_delay: Duration::ZERO,
        };
        assert_eq!(limits.split_words(150), Some(100));
        assert_eq!(limits.split_words(300), None);
        assert_eq!(limits.split_words(301), None);
    }
}
