//! GPTZero AI detection.

use redraft_core::detect::{AiDetector, DetectionResult, DetectionSource};
use serde::{Deserialize, Serialize};

use crate::ReqwestClient;
use crate::error::Error;

/// Tracing target for detection requests.
const TRACING_TARGET: &str = "redraft_reqwest::detect";

/// Probability above which a text is reported as AI generated.
const AI_THRESHOLD: f64 = 0.5;

#[derive(Debug, Serialize)]
struct PredictRequest<'a> {
    document: &'a str,
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    #[serde(default)]
    documents: Vec<DocumentScore>,
}

#[derive(Debug, Deserialize)]
struct DocumentScore {
    completely_generated_prob: f64,
    #[serde(default)]
    predicted_class: Option<String>,
}

/// Adapter for the GPTZero prediction API.
#[derive(Clone)]
pub struct GptZeroDetector {
    client: ReqwestClient,
    endpoint: String,
    api_key: String,
}

impl std::fmt::Debug for GptZeroDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GptZeroDetector")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl GptZeroDetector {
    /// Default prediction endpoint.
    pub const ENDPOINT: &'static str = "https://api.gptzero.me/v2/predict/text";

    /// Creates a detector with the default endpoint.
    pub fn new(client: ReqwestClient, api_key: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: Self::ENDPOINT.to_owned(),
            api_key: api_key.into(),
        }
    }
}

fn into_result(response: PredictResponse) -> Result<DetectionResult, Error> {
    let score = response
        .documents
        .into_iter()
        .next()
        .ok_or_else(|| Error::Response("response has no document score".to_owned()))?;

    let probability = score.completely_generated_prob;
    let mut details = format!("{:.0}% probability of AI generation", probability * 100.0);
    if let Some(class) = score.predicted_class {
        details.push_str(&format!(" (predicted class: {class})"));
    }

    Ok(DetectionResult::new(
        probability > AI_THRESHOLD,
        probability,
        details,
        DetectionSource::Detector,
    ))
}

#[async_trait::async_trait]
impl AiDetector for GptZeroDetector {
    fn name(&self) -> &str {
        "gptzero"
    }

    async fn detect(&self, text: &str) -> redraft_core::Result<DetectionResult> {
        tracing::debug!(
            target: TRACING_TARGET,
            chars = text.len(),
            "Requesting GPTZero prediction"
        );

        let http_request = self
            .client
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key);

        let response: PredictResponse = self
            .client
            .send_json(http_request, &PredictRequest { document: text })
            .await?;

        Ok(into_result(response)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_first_document_score() -> anyhow::Result<()> {
        let response: PredictResponse = serde_json::from_str(
            r#"{"documents": [{"completely_generated_prob": 0.92, "predicted_class": "ai"}]}"#,
        )?;

        let result = into_result(response)?;
        assert!(result.is_ai);
        assert_eq!(result.confidence, 0.92);
        assert!(result.details.contains("92%"));
        assert_eq!(result.source, DetectionSource::Detector);
        Ok(())
    }

    #[test]
    fn missing_documents_is_an_error() -> anyhow::Result<()> {
        let response: PredictResponse = serde_json::from_str(r#"{"documents": []}"#)?;
        assert!(into_result(response).is_err());
        Ok(())
    }
}
