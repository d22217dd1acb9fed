use std::collections::BTreeMap;
use std::sync::Arc;

use super::{LanguageProvider, LanguageService, ProviderKind, Result, TRACING_TARGET};
use crate::Error;

/// Maps each configured [`ProviderKind`] to its [`LanguageService`].
///
/// Providers whose API key is absent are simply not registered; asking for
/// one fails fast with a configuration error instead of degrading silently.
#[derive(Debug, Clone, Default)]
pub struct ProviderRegistry {
    services: Arc<BTreeMap<ProviderKind, LanguageService>>,
}

impl ProviderRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a provider, replacing any previous adapter of the same kind.
    pub fn with_provider<P>(self, provider: P) -> Self
    where
        P: LanguageProvider + 'static,
    {
        self.with_service(LanguageService::from_provider(provider))
    }

    /// Registers an already wrapped service.
    pub fn with_service(self, service: LanguageService) -> Self {
        let mut services = Arc::unwrap_or_clone(self.services);
        let kind = service.kind();

        tracing::debug!(
            target: TRACING_TARGET,
            provider = %kind,
            model = service.model(),
            "Registered provider"
        );

        services.insert(kind, service);
        Self {
            services: Arc::new(services),
        }
    }

    /// Returns the service for `kind`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error naming the missing environment variable
    /// when the provider was not configured.
    pub fn get(&self, kind: ProviderKind) -> Result<LanguageService> {
        self.services.get(&kind).cloned().ok_or_else(|| {
            Error::configuration().with_provider(kind).with_message(format!(
                "{} provider is not configured: set {}",
                kind,
                kind.api_key_env()
            ))
        })
    }

    /// Returns true if `kind` is configured.
    pub fn contains(&self, kind: ProviderKind) -> bool {
        self.services.contains_key(&kind)
    }

    /// Returns the configured providers in a stable order.
    pub fn available(&self) -> Vec<ProviderKind> {
        self.services.keys().copied().collect()
    }

    /// Returns true if no provider is configured.
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use crate::mock::MockProvider;

    #[test]
    fn missing_provider_fails_fast() {
        let registry = ProviderRegistry::new().with_provider(MockProvider::echo(ProviderKind::OpenAi));

        let error = registry.get(ProviderKind::Anthropic).unwrap_err();
        assert_eq!(error.kind, ErrorKind::Configuration);
        assert!(error.to_string().contains("ANTHROPIC_API_KEY"));
    }

    #[test]
    fn available_lists_registered_kinds() {
        let registry = ProviderRegistry::new()
            .with_provider(MockProvider::echo(ProviderKind::Perplexity))
            .with_provider(MockProvider::echo(ProviderKind::OpenAi));

        assert_eq!(
            registry.available(),
            vec![ProviderKind::OpenAi, ProviderKind::Perplexity]
        );
        assert!(registry.contains(ProviderKind::OpenAi));
        assert!(!registry.is_empty());
    }
}
