use serde::Deserialize;

use super::{AiDetector, DetectionResult, DetectionSource};
use crate::provider::{CompletionRequest, LanguageService, PromptTemplate};
use crate::{Error, Result};

/// Self-assessment reply expected from the model.
#[derive(Debug, Deserialize)]
struct Assessment {
    #[serde(rename = "isAI", alias = "isAi", alias = "is_ai")]
    is_ai: bool,
    #[serde(default)]
    confidence: f64,
    #[serde(default)]
    details: String,
}

/// Asks a language model whether a text was machine generated.
#[derive(Debug, Clone)]
pub struct LlmDetector {
    service: LanguageService,
}

impl LlmDetector {
    /// Creates a detector backed by `service`.
    pub fn new(service: LanguageService) -> Self {
        Self { service }
    }
}

#[async_trait::async_trait]
impl AiDetector for LlmDetector {
    fn name(&self) -> &str {
        self.service.kind().as_str()
    }

    async fn detect(&self, text: &str) -> Result<DetectionResult> {
        let request = CompletionRequest::single(PromptTemplate::DetectAi.system_prompt(), text)
            .with_max_output_tokens(512);
        let response = self.service.complete(&request).await?;

        let assessment = parse_assessment(&response.content).map_err(|error| {
            error.with_provider(self.service.kind())
        })?;

        Ok(DetectionResult::new(
            assessment.is_ai,
            assessment.confidence,
            assessment.details,
            DetectionSource::LanguageModel,
        ))
    }
}

/// Extracts the JSON object between the first `{` and the last `}`.
fn parse_assessment(content: &str) -> Result<Assessment> {
    let object = content
        .find('{')
        .zip(content.rfind('}'))
        .filter(|(start, end)| start < end)
        .map(|(start, end)| &content[start..=end])
        .ok_or_else(|| {
            Error::external_error().with_message("detection reply does not contain a JSON object")
        })?;

    serde_json::from_str(object).map_err(|error| {
        Error::external_error()
            .with_message(format!("detection reply is not valid: {error}"))
            .with_source(error)
    })
}
