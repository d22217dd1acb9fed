use std::fmt;
use std::sync::Arc;

use super::{AiDetector, DetectionResult, LlmDetector, TRACING_TARGET};
use crate::provider::{ProviderKind, ProviderRegistry};
use crate::{Error, Result};

/// Runs detection against the primary detector with a language-model
/// fallback.
#[derive(Clone)]
pub struct DetectionService {
    primary: Option<Arc<dyn AiDetector>>,
    registry: ProviderRegistry,
}

impl fmt::Debug for DetectionService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DetectionService")
            .field("primary", &self.primary.as_ref().map(|d| d.name().to_owned()))
            .field("registry", &self.registry)
            .finish()
    }
}

impl DetectionService {
    /// Creates a service without a primary detector.
    pub fn new(registry: ProviderRegistry) -> Self {
        Self {
            primary: None,
            registry,
        }
    }

    /// Sets the primary detector.
    #[must_use]
    pub fn with_primary<D>(mut self, detector: D) -> Self
    where
        D: AiDetector + 'static,
    {
        self.primary = Some(Arc::new(detector));
        self
    }

    /// Sets the primary detector from a shared handle.
    #[must_use]
    pub fn with_shared_primary(mut self, detector: Option<Arc<dyn AiDetector>>) -> Self {
        self.primary = detector;
        self
    }

    /// Returns true if a primary detector is configured.
    pub fn has_primary(&self) -> bool {
        self.primary.is_some()
    }

    /// Scores `text`, falling back to `provider`'s self-assessment when the
    /// primary detector is missing or fails.
    pub async fn detect(&self, text: &str, provider: ProviderKind) -> Result<DetectionResult> {
        ensure_text(text)?;

        if let Some(primary) = &self.primary {
            match primary.detect(text).await {
                Ok(result) => return Ok(result),
                Err(error) => {
                    tracing::warn!(
                        target: TRACING_TARGET,
                        detector = primary.name(),
                        fallback = %provider,
                        error = %error,
                        "Primary detector failed, falling back to language model"
                    );
                }
            }
        }

        let service = self.registry.get(provider)?;
        LlmDetector::new(service).detect(text).await
    }

    /// Scores `text` with the primary detector only.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if no primary detector is configured.
    pub async fn detect_primary(&self, text: &str) -> Result<DetectionResult> {
        ensure_text(text)?;

        let primary = self.primary.as_ref().ok_or_else(|| {
            Error::configuration()
                .with_message("AI detection service is not configured: set GPTZERO_API_KEY")
        })?;
        primary.detect(text).await
    }
}

fn ensure_text(text: &str) -> Result<()> {
    if text.trim().is_empty() {
        return Err(Error::invalid_input().with_message("text to analyze is empty"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use crate::detect::DetectionSource;
    use crate::mock::{MockDetector, MockProvider};

    fn registry() -> ProviderRegistry {
        let reply = r#"{"isAI": true, "confidence": 0.6, "details": "self assessed"}"#;
        ProviderRegistry::new().with_provider(MockProvider::fixed(ProviderKind::OpenAi, reply))
    }

    #[tokio::test]
    async fn primary_detector_wins() -> anyhow::Result<()> {
        let service = DetectionService::new(registry()).with_primary(MockDetector::new(0.1));
        let result = service.detect("Some text", ProviderKind::OpenAi).await?;
        assert_eq!(result.source, DetectionSource::Detector);
        assert!(!result.is_ai);
        Ok(())
    }

    #[tokio::test]
    async fn failing_primary_falls_back_to_model() -> anyhow::Result<()> {
        let service = DetectionService::new(registry()).with_primary(MockDetector::failing());
        let result = service.detect("Some text", ProviderKind::OpenAi).await?;
        assert_eq!(result.source, DetectionSource::LanguageModel);
        assert_eq!(result.confidence, 0.6);
        Ok(())
    }

    #[tokio::test]
    async fn primary_only_requires_configuration() {
        let service = DetectionService::new(registry());
        let error = service.detect_primary("Some text").await.unwrap_err();
        assert_eq!(error.kind, ErrorKind::Configuration);
    }

    #[tokio::test]
    async fn empty_text_is_rejected() {
        let service = DetectionService::new(registry());
        let error = service.detect("  ", ProviderKind::OpenAi).await.unwrap_err();
        assert_eq!(error.kind, ErrorKind::InvalidInput);
    }
}
