//! AI detection handlers.

use aide::axum::ApiRouter;
use aide::transform::TransformOperation;
use axum::extract::State;
use axum::http::StatusCode;
use redraft_core::detect::{DetectionResult, DetectionService};

use crate::extract::{Json, ValidateJson};
use crate::handler::Result;
use crate::handler::request::{CheckAi, DetectAi};
use crate::handler::response::ErrorResponse;
use crate::service::ServiceState;

/// Tracing target for AI detection.
const TRACING_TARGET: &str = "redraft_server::handler::detection";

/// Scores a text, falling back to the selected provider's self-assessment.
#[tracing::instrument(skip_all, fields(provider = %request.llm_provider))]
async fn detect_ai(
    State(detection): State<DetectionService>,
    ValidateJson(request): ValidateJson<DetectAi>,
) -> Result<(StatusCode, Json<DetectionResult>)> {
    tracing::debug!(
        target: TRACING_TARGET,
        text_chars = request.text.len(),
        primary = detection.has_primary(),
        "Detecting AI generated text"
    );

    let result = detection.detect(&request.text, request.llm_provider).await?;

    tracing::info!(
        target: TRACING_TARGET,
        is_ai = result.is_ai,
        confidence = result.confidence,
        source = ?result.source,
        "Detection finished"
    );

    Ok((StatusCode::OK, Json(result)))
}

fn detect_ai_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Detect AI text")
        .description(
            "Scores the text with the dedicated detector. When it is not configured or \
             fails, the selected provider assesses the text instead.",
        )
        .response::<200, Json<DetectionResult>>()
        .response::<400, Json<ErrorResponse>>()
        .response::<502, Json<ErrorResponse>>()
        .response::<503, Json<ErrorResponse>>()
}

/// Scores a text with the dedicated detector only.
#[tracing::instrument(skip_all)]
async fn check_ai(
    State(detection): State<DetectionService>,
    ValidateJson(request): ValidateJson<CheckAi>,
) -> Result<(StatusCode, Json<DetectionResult>)> {
    let result = detection.detect_primary(&request.text).await?;

    tracing::info!(
        target: TRACING_TARGET,
        is_ai = result.is_ai,
        confidence = result.confidence,
        "Detector check finished"
    );

    Ok((StatusCode::OK, Json(result)))
}

fn check_ai_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Check text with the detector")
        .description("Scores the text with the dedicated detector without any fallback.")
        .response::<200, Json<DetectionResult>>()
        .response::<400, Json<ErrorResponse>>()
        .response::<502, Json<ErrorResponse>>()
        .response::<503, Json<ErrorResponse>>()
}

/// Returns a [`Router`] with all AI detection routes.
///
/// [`Router`]: axum::routing::Router
pub fn routes() -> ApiRouter<ServiceState> {
    use aide::axum::routing::*;

    ApiRouter::new()
        .api_route("/api/detect-ai", post_with(detect_ai, detect_ai_docs))
        .api_route("/api/gpt-bypass/check-ai", post_with(check_ai, check_ai_docs))
        .with_path_items(|item| item.tag("Detection"))
}
