//! Provider wrapper with observability.

use std::fmt;
use std::sync::Arc;

use jiff::Timestamp;

use super::{
    CompletionRequest, CompletionResponse, LanguageProvider, ProviderKind, ProviderLimits,
    Result, TRACING_TARGET,
};

/// A [`LanguageProvider`] with structured logging around every completion.
#[derive(Clone)]
pub struct LanguageService {
    provider: Arc<dyn LanguageProvider>,
}

impl fmt::Debug for LanguageService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LanguageService")
            .field("kind", &self.provider.kind())
            .field("model", &self.provider.model())
            .finish_non_exhaustive()
    }
}

impl LanguageService {
    /// Creates a new service from a provider.
    pub fn from_provider<P>(provider: P) -> Self
    where
        P: LanguageProvider + 'static,
    {
        Self {
            provider: Arc::new(provider),
        }
    }

    /// Creates a new service from a shared provider.
    pub fn from_shared(provider: Arc<dyn LanguageProvider>) -> Self {
        Self { provider }
    }

    /// Returns which backend this service talks to.
    pub fn kind(&self) -> ProviderKind {
        self.provider.kind()
    }

    /// Returns the model identifier of the backend.
    pub fn model(&self) -> &str {
        self.provider.model()
    }

    /// Returns the token limits of the backend.
    pub fn limits(&self) -> ProviderLimits {
        self.provider.limits()
    }

    /// Generates a completion, logging timing and outcome.
    ///
    /// Errors are returned attributed to this provider.
    pub async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse> {
        let started_at = Timestamp::now();
        let kind = self.provider.kind();
        let estimated_tokens = request.estimated_tokens();

        tracing::debug!(
            target: TRACING_TARGET,
            provider = %kind,
            model = self.provider.model(),
            estimated_tokens,
            turns = request.messages.len(),
            "Sending completion request"
        );

        let result = self
            .provider
            .complete(request)
            .await
            .map_err(|error| match error.provider {
                Some(_) => error,
                None => error.with_provider(kind),
            });
        let elapsed = Timestamp::now().duration_since(started_at);

        match &result {
            Ok(response) => {
                tracing::debug!(
                    target: TRACING_TARGET,
                    provider = %kind,
                    output_chars = response.content.len(),
                    input_tokens = response.usage.map(|u| u.input_tokens),
                    output_tokens = response.usage.map(|u| u.output_tokens),
                    elapsed_ms = elapsed.as_millis(),
                    "Completion successful"
                );
            }
            Err(error) => {
                tracing::error!(
                    target: TRACING_TARGET,
                    provider = %kind,
                    error = %error,
                    elapsed_ms = elapsed.as_millis(),
                    "Completion failed"
                );
            }
        }

        result
    }
}
