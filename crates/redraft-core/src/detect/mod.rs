//! AI-generated text detection.
//!
//! A dedicated detector (GPTZero in production) is consulted first. When it
//! is missing or fails, the [`DetectionService`] asks the selected language
//! model for a self-assessment through the [`LlmDetector`].

mod llm;
mod service;

use serde::{Deserialize, Serialize};

pub use llm::LlmDetector;
pub use service::DetectionService;

use crate::Result;

/// Tracing target for detection operations.
pub const TRACING_TARGET: &str = "redraft_core::detect";

/// Which backend produced a [`DetectionResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
#[serde(rename_all = "camelCase")]
pub enum DetectionSource {
    /// A dedicated detection service.
    Detector,
    /// A language model's self-assessment.
    LanguageModel,
}

/// Verdict on whether a text was machine generated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
#[serde(rename_all = "camelCase")]
pub struct DetectionResult {
    /// True if the text is judged to be AI generated.
    #[serde(rename = "isAI")]
    pub is_ai: bool,
    /// Probability that the text is AI generated, between 0 and 1.
    pub confidence: f64,
    /// Human readable explanation.
    pub details: String,
    /// Backend that produced the verdict.
    pub source: DetectionSource,
}

impl DetectionResult {
    /// Creates a result, clamping `confidence` into `0..=1`.
    pub fn new(
        is_ai: bool,
        confidence: f64,
        details: impl Into<String>,
        source: DetectionSource,
    ) -> Self {
        let confidence = if confidence.is_finite() {
            confidence.clamp(0.0, 1.0)
        } else {
            0.0
        };

        Self {
            is_ai,
            confidence,
            details: details.into(),
            source,
        }
    }
}

/// A backend that scores text for machine authorship.
#[async_trait::async_trait]
pub trait AiDetector: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Scores `text`.
    async fn detect(&self, text: &str) -> Result<DetectionResult>;
}
