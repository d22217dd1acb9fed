//! Text rewriting handlers.
//!
//! `process-text` rewrites a whole text in one provider call. A text too long
//! for one request becomes a document job rewritten in the background, so the
//! request never waits on many sequential provider calls.
//! `process-chunk` rewrites one chunk of a document the client has already
//! split.

use aide::axum::ApiRouter;
use aide::transform::TransformOperation;
use axum::extract::State;
use axum::http::StatusCode;
use redraft_core::chunk::{Chunker, ChunkerConfig, Selection};
use redraft_core::pipeline::{Dispatcher, ProcessingMode};

use crate::extract::{Json, ValidateJson};
use crate::handler::Result;
use crate::handler::request::{ProcessChunk, ProcessText};
use crate::handler::response::{ErrorResponse, ProcessedChunk, ProcessedText};
use crate::service::{ProcessingJobs, RunRequest, ServiceState};

/// Tracing target for text rewriting.
const TRACING_TARGET: &str = "redraft_server::handler::text";

/// Rewrites a text according to the instructions.
#[tracing::instrument(
    skip_all,
    fields(
        provider = %request.llm_provider,
        exam_mode = request.exam_mode,
    )
)]
async fn process_text(
    State(dispatcher): State<Dispatcher>,
    State(processing_jobs): State<ProcessingJobs>,
    ValidateJson(request): ValidateJson<ProcessText>,
) -> Result<(StatusCode, Json<ProcessedText>)> {
    let (options, input_text) = request.into_parts();

    tracing::info!(
        target: TRACING_TARGET,
        input_chars = input_text.len(),
        content_source = options.content_source.is_some(),
        style_source = options.style_source.is_some(),
        "Processing text"
    );

    if let Some(split_words) = dispatcher.split_words_for(&options, &input_text)? {
        let chunker = Chunker::new(ChunkerConfig::fixed(split_words));
        let job = processing_jobs.create(&input_text, Some(chunker)).await?;
        let run = RunRequest {
            mode: ProcessingMode::Rewrite,
            selection: Selection::All,
            add_count: 0,
            options,
        };
        let job = processing_jobs.start(job.id, run).await?;

        tracing::info!(
            target: TRACING_TARGET,
            job_id = %job.id,
            chunks = job.chunks.len(),
            "Text too long for one request, processing in the background"
        );

        return Ok((StatusCode::ACCEPTED, Json(ProcessedText::deferred(job.id))));
    }

    let result = dispatcher.rewrite(&options, &input_text).await?;

    tracing::info!(
        target: TRACING_TARGET,
        output_chars = result.len(),
        "Text processed"
    );

    Ok((StatusCode::OK, Json(ProcessedText::new(result))))
}

fn process_text_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Rewrite text")
        .description(
            "Rewrites the input text with the selected provider. Content and style sources \
             are passed to the provider when enabled. A text too long for one provider \
             request is rewritten by a background document job instead: the response is \
             202 with `jobId`, and the result is read from `GET /api/documents/{jobId}`.",
        )
        .response::<200, Json<ProcessedText>>()
        .response::<202, Json<ProcessedText>>()
        .response::<400, Json<ErrorResponse>>()
        .response::<429, Json<ErrorResponse>>()
        .response::<502, Json<ErrorResponse>>()
        .response::<503, Json<ErrorResponse>>()
        .response::<504, Json<ErrorResponse>>()
}

/// Rewrites one chunk of a client-chunked document.
#[tracing::instrument(
    skip_all,
    fields(
        provider = %request.text.llm_provider,
        chunk_index = request.chunk_index,
        total_chunks = request.total_chunks,
    )
)]
async fn process_chunk(
    State(dispatcher): State<Dispatcher>,
    ValidateJson(request): ValidateJson<ProcessChunk>,
) -> Result<(StatusCode, Json<ProcessedChunk>)> {
    let ProcessChunk {
        text,
        chunk_index,
        total_chunks,
    } = request;
    let (options, input_text) = text.into_parts();

    tracing::debug!(
        target: TRACING_TARGET,
        input_chars = input_text.len(),
        "Processing chunk"
    );

    let result = dispatcher.rewrite(&options, &input_text).await?;

    tracing::info!(
        target: TRACING_TARGET,
        chunk = chunk_index + 1,
        total = total_chunks,
        "Chunk processed"
    );

    let response = ProcessedChunk {
        result,
        chunk_index,
        total_chunks,
    };

    Ok((StatusCode::OK, Json(response)))
}

fn process_chunk_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Rewrite chunk")
        .description(
            "Rewrites one chunk of a document and echoes its position so the client can \
             reassemble the result.",
        )
        .response::<200, Json<ProcessedChunk>>()
        .response::<400, Json<ErrorResponse>>()
        .response::<429, Json<ErrorResponse>>()
        .response::<502, Json<ErrorResponse>>()
        .response::<503, Json<ErrorResponse>>()
        .response::<504, Json<ErrorResponse>>()
}

/// Returns a [`Router`] with all text rewriting routes.
///
/// [`Router`]: axum::routing::Router
pub fn routes() -> ApiRouter<ServiceState> {
    use aide::axum::routing::*;

    ApiRouter::new()
        .api_route("/api/process-text", post_with(process_text, process_text_docs))
        .api_route("/api/process-chunk", post_with(process_chunk, process_chunk_docs))
        .with_path_items(|item| item.tag("Text"))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use redraft_core::mock::MockProvider;
    use redraft_core::pipeline::JobState;
    use redraft_core::provider::ProviderLimits;
    use redraft_core::{ProviderKind, ProviderRegistry};
    use serde_json::json;

    use super::*;
    use crate::handler::documents;
    use crate::handler::response::DocumentJob;
    use crate::handler::test::{
        create_test_server_with_router, create_test_server_with_state, test_state_from_registry,
    };

    #[tokio::test]
    async fn process_text_returns_result() -> anyhow::Result<()> {
        let server = create_test_server_with_router(|_| routes())?;

        let response = server
            .post("/api/process-text")
            .json(&json!({
                "inputText": "The cost is $5 today.",
                "instructions": "Keep it short",
                "llmProvider": "openai",
                "useContentSource": false,
            }))
            .await;
        response.assert_status_ok();

        let body = response.json::<ProcessedText>();
        assert!(body.result.contains("5 dollars"));
        Ok(())
    }

    #[tokio::test]
    async fn unconfigured_provider_is_unavailable() -> anyhow::Result<()> {
        let server = create_test_server_with_router(|_| routes())?;

        let response = server
            .post("/api/process-text")
            .json(&json!({
                "inputText": "Hello",
                "instructions": "",
                "llmProvider": "perplexity",
                "useContentSource": false,
            }))
            .await;
        response.assert_status(StatusCode::SERVICE_UNAVAILABLE);

        let body = response.json::<serde_json::Value>();
        assert_eq!(body["name"], "service_unavailable");
        assert_eq!(body["resource"], "perplexity");
        Ok(())
    }

    #[tokio::test]
    async fn process_chunk_echoes_position() -> anyhow::Result<()> {
        let server = create_test_server_with_router(|_| routes())?;

        let response = server
            .post("/api/process-chunk")
            .json(&json!({
                "inputText": "A paragraph.",
                "instructions": "Rewrite",
                "llmProvider": "anthropic",
                "useContentSource": false,
                "chunkIndex": 1,
                "totalChunks": 3,
            }))
            .await;
        response.assert_status_ok();

        let body = response.json::<ProcessedChunk>();
        assert_eq!(body.chunk_index, 1);
        assert_eq!(body.total_chunks, 3);
        assert!(body.result.contains("A paragraph."));
        Ok(())
    }

    #[tokio::test]
    async fn chunk_index_out_of_range_is_rejected() -> anyhow::Result<()> {
        let server = create_test_server_with_router(|_| routes())?;

        let response = server
            .post("/api/process-chunk")
            .json(&json!({
                "inputText": "A paragraph.",
                "llmProvider": "openai",
                "chunkIndex": 3,
                "totalChunks": 3,
            }))
            .await;
        response.assert_status_bad_request();
        Ok(())
    }

    #[tokio::test]
    async fn malformed_body_is_rejected() -> anyhow::Result<()> {
        let server = create_test_server_with_router(|_| routes())?;

        let response = server
            .post("/api/process-text")
            .json(&json!({ "inputText": "Hello" }))
            .await;
        response.assert_status_bad_request();

        let body = response.json::<serde_json::Value>();
        assert_eq!(body["name"], "bad_request");
        Ok(())
    }

    #[tokio::test]
    async fn long_text_becomes_a_background_job() -> anyhow::Result<()> {
        // 30 output tokens leave room for 20 words per request.
        let provider = MockProvider::with_prefix(ProviderKind::OpenAi, "NEW ").with_limits(
            ProviderLimits {
                max_input_tokens: 100_000,
                max_output_tokens: 30,
                fallback_chunk_words: 20,
                fallback_delay: Duration::ZERO,
            },
        );
        let state = test_state_from_registry(ProviderRegistry::new().with_provider(provider.clone()));
        let server = create_test_server_with_state(|_| routes().merge(documents::routes()), state)?;
        let input_text = (0..3)
            .map(|i| format!("Paragraph {i} has exactly a dozen words in it for this small test."))
            .collect::<Vec<_>>()
            .join("\n\n");

        let response = server
            .post("/api/process-text")
            .json(&json!({
                "inputText": input_text,
                "instructions": "Rewrite",
                "llmProvider": "openai",
                "useContentSource": false,
            }))
            .await;
        response.assert_status(StatusCode::ACCEPTED);

        let body = response.json::<ProcessedText>();
        assert!(body.result.is_empty());
        let Some(job_id) = body.job_id else {
            anyhow::bail!("deferred response carries no job id");
        };

        let mut job = None;
        for _ in 0..200 {
            let current = server
                .get(&format!("/api/documents/{job_id}"))
                .await
                .json::<DocumentJob>();
            if current.status.is_terminal() {
                job = Some(current);
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        let Some(job) = job else {
            anyhow::bail!("job {job_id} did not finish");
        };

        assert_eq!(job.status, JobState::Completed);
        assert_eq!(job.chunks.len(), 3);
        assert_eq!(job.output.matches("NEW Paragraph").count(), 3);
        assert_eq!(provider.calls(), 3);
        Ok(())
    }

    #[tokio::test]
    async fn short_text_is_answered_in_the_request() -> anyhow::Result<()> {
        let server = create_test_server_with_router(|_| routes())?;

        let response = server
            .post("/api/process-text")
            .json(&json!({
                "inputText": "One sentence.",
                "instructions": "Rewrite",
                "llmProvider": "anthropic",
                "useContentSource": false,
            }))
            .await;
        response.assert_status_ok();

        let body = response.json::<serde_json::Value>();
        assert!(body.get("jobId").is_none());
        Ok(())
    }
}
