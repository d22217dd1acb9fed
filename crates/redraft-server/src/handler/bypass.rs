//! GPT-Bypass handlers.
//!
//! Every rewrite is recorded as a [`RewriteJob`] before the provider is
//! called, so failed attempts remain visible through the job endpoints.
//!
//! [`RewriteJob`]: crate::service::RewriteJob

use aide::axum::ApiRouter;
use aide::transform::TransformOperation;
use axum::extract::State;
use axum::http::StatusCode;
use redraft_core::chunk::{Chunker, ChunkerConfig};
use redraft_core::pipeline::Dispatcher;
use validator::Validate;

use crate::extract::{Json, Path, Query, ValidateJson};
use crate::handler::request::{BypassRewrite, ChunkText, ListRewriteJobs, RewriteJobPathParams};
use crate::handler::response::{
    BypassResult, ChunkPreviews, ErrorResponse, RewriteJob, RewriteJobs,
};
use crate::handler::{Error, Result};
use crate::service::{self, RewriteStatus, ServiceState};

/// Tracing target for GPT-Bypass operations.
const TRACING_TARGET: &str = "redraft_server::handler::bypass";

/// Humanizes a text and records the attempt.
#[tracing::instrument(skip_all, fields(provider = %request.provider))]
async fn rewrite(
    State(dispatcher): State<Dispatcher>,
    State(rewrite_jobs): State<service::RewriteJobs>,
    ValidateJson(request): ValidateJson<BypassRewrite>,
) -> Result<(StatusCode, Json<BypassResult>)> {
    let BypassRewrite {
        input_text,
        style_text,
        provider,
        custom_instructions,
    } = request;

    let job = service::RewriteJob::pending(input_text, style_text, provider);
    let job = rewrite_jobs.create(job).await;

    tracing::info!(
        target: TRACING_TARGET,
        job_id = %job.id,
        input_chars = job.input_text.len(),
        style = job.style_text.is_some(),
        "Rewrite job started"
    );

    let result = dispatcher
        .bypass(
            provider,
            &job.input_text,
            job.style_text.as_deref(),
            custom_instructions.as_deref(),
        )
        .await;

    let output_text = match result {
        Ok(output_text) => output_text,
        Err(error) => {
            tracing::warn!(
                target: TRACING_TARGET,
                job_id = %job.id,
                error = %error,
                "Rewrite job failed"
            );
            rewrite_jobs.fail(job.id, error.to_string()).await;
            return Err(error.into());
        }
    };

    rewrite_jobs.complete(job.id, output_text.clone()).await;

    tracing::info!(
        target: TRACING_TARGET,
        job_id = %job.id,
        output_chars = output_text.len(),
        "Rewrite job completed"
    );

    let response = BypassResult {
        job_id: job.id,
        output_text,
        status: RewriteStatus::Completed,
    };

    Ok((StatusCode::OK, Json(response)))
}

fn rewrite_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Humanize text")
        .description(
            "Rewrites the text so it reads as human written, optionally imitating a style \
             sample. The attempt is stored as a rewrite job whether or not it succeeds.",
        )
        .response::<200, Json<BypassResult>>()
        .response::<400, Json<ErrorResponse>>()
        .response::<429, Json<ErrorResponse>>()
        .response::<502, Json<ErrorResponse>>()
        .response::<503, Json<ErrorResponse>>()
        .response::<504, Json<ErrorResponse>>()
}

/// Splits a text into chunks without processing it.
#[tracing::instrument(skip_all, fields(max_words = request.max_words))]
async fn chunk_text(
    State(chunker): State<Chunker>,
    ValidateJson(request): ValidateJson<ChunkText>,
) -> Result<(StatusCode, Json<ChunkPreviews>)> {
    let chunker = request
        .max_words
        .map(|words| Chunker::new(ChunkerConfig::fixed(words)))
        .unwrap_or(chunker);

    let previews: ChunkPreviews = chunker.chunk(&request.text).into_iter().collect();

    tracing::debug!(
        target: TRACING_TARGET,
        chunks = previews.chunks.len(),
        "Text chunked"
    );

    Ok((StatusCode::OK, Json(previews)))
}

fn chunk_text_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Preview chunks")
        .description(
            "Splits the text at paragraph and sentence boundaries. Without `maxWords` the \
             chunk size grows with the length of the text.",
        )
        .response::<200, Json<ChunkPreviews>>()
        .response::<400, Json<ErrorResponse>>()
}

/// Returns a stored rewrite job.
#[tracing::instrument(skip_all, fields(job_id = %path_params.id))]
async fn get_job(
    State(rewrite_jobs): State<service::RewriteJobs>,
    Path(path_params): Path<RewriteJobPathParams>,
) -> Result<(StatusCode, Json<RewriteJob>)> {
    let Some(job) = rewrite_jobs.find(path_params.id).await else {
        return Err(Error::not_found("rewrite_job", "Rewrite job not found"));
    };

    Ok((StatusCode::OK, Json(job.into())))
}

fn get_job_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Get rewrite job")
        .description("Returns a rewrite job with its input, output and status.")
        .response::<200, Json<RewriteJob>>()
        .response::<400, Json<ErrorResponse>>()
        .response::<404, Json<ErrorResponse>>()
}

/// Lists recent rewrite jobs.
#[tracing::instrument(skip_all, fields(limit = query.limit))]
async fn list_jobs(
    State(rewrite_jobs): State<service::RewriteJobs>,
    Query(query): Query<ListRewriteJobs>,
) -> Result<(StatusCode, Json<RewriteJobs>)> {
    query.validate()?;

    let jobs: RewriteJobs = rewrite_jobs
        .list(query.limit)
        .await
        .into_iter()
        .map(RewriteJob::from)
        .collect();

    tracing::debug!(
        target: TRACING_TARGET,
        count = jobs.len(),
        "Rewrite jobs listed"
    );

    Ok((StatusCode::OK, Json(jobs)))
}

fn list_jobs_docs(op: TransformOperation) -> TransformOperation {
    op.summary("List rewrite jobs")
        .description("Returns the most recent rewrite jobs, newest first.")
        .response::<200, Json<RewriteJobs>>()
        .response::<400, Json<ErrorResponse>>()
}

/// Returns a [`Router`] with all GPT-Bypass routes.
///
/// [`Router`]: axum::routing::Router
pub fn routes() -> ApiRouter<ServiceState> {
    use aide::axum::routing::*;

    ApiRouter::new()
        .api_route("/api/gpt-bypass/rewrite", post_with(rewrite, rewrite_docs))
        .api_route("/api/gpt-bypass/chunk-text", post_with(chunk_text, chunk_text_docs))
        .api_route("/api/gpt-bypass/job/{id}", get_with(get_job, get_job_docs))
        .api_route("/api/gpt-bypass/jobs", get_with(list_jobs, list_jobs_docs))
        .with_path_items(|item| item.tag("GPT-Bypass"))
}

#[cfg(test)]
mod tests {
    use redraft_core::ProviderKind;
    use redraft_core::mock::MockProvider;
    use serde_json::json;
    use uuid::Uuid;

    use super::*;
    use crate::handler::test::{
        create_test_server_with_router, create_test_server_with_state, test_state_from_registry,
    };

    #[tokio::test]
    async fn rewrite_stores_completed_job() -> anyhow::Result<()> {
        let server = create_test_server_with_router(|_| routes())?;

        let response = server
            .post("/api/gpt-bypass/rewrite")
            .json(&json!({
                "inputText": "It costs $20.",
                "styleText": "Casual and short.",
                "provider": "anthropic",
            }))
            .await;
        response.assert_status_ok();

        let result = response.json::<BypassResult>();
        assert_eq!(result.status, RewriteStatus::Completed);
        assert!(result.output_text.contains("20 dollars"));

        let response = server
            .get(&format!("/api/gpt-bypass/job/{}", result.job_id))
            .await;
        response.assert_status_ok();

        let job = response.json::<RewriteJob>();
        assert_eq!(job.status, RewriteStatus::Completed);
        assert_eq!(job.style_text.as_deref(), Some("Casual and short."));
        assert_eq!(job.output_text, Some(result.output_text));
        Ok(())
    }

    #[tokio::test]
    async fn failed_rewrite_is_recorded() -> anyhow::Result<()> {
        let registry = redraft_core::ProviderRegistry::new()
            .with_provider(MockProvider::echo(ProviderKind::OpenAi).fail_on_call(1));
        let state = test_state_from_registry(registry);
        let server = create_test_server_with_state(|_| routes(), state)?;

        let response = server
            .post("/api/gpt-bypass/rewrite")
            .json(&json!({ "inputText": "Hello", "provider": "openai" }))
            .await;
        response.assert_status(StatusCode::BAD_GATEWAY);

        let response = server.get("/api/gpt-bypass/jobs").await;
        response.assert_status_ok();

        let jobs = response.json::<RewriteJobs>();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].status, RewriteStatus::Error);
        assert!(jobs[0].error_message.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn list_jobs_applies_limit() -> anyhow::Result<()> {
        let server = create_test_server_with_router(|_| routes())?;

        for text in ["first", "second", "third"] {
            server
                .post("/api/gpt-bypass/rewrite")
                .json(&json!({ "inputText": text, "provider": "openai" }))
                .await
                .assert_status_ok();
        }

        let response = server.get("/api/gpt-bypass/jobs?limit=2").await;
        response.assert_status_ok();

        let jobs = response.json::<RewriteJobs>();
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].input_text, "third");

        let response = server.get("/api/gpt-bypass/jobs?limit=0").await;
        response.assert_status_bad_request();
        Ok(())
    }

    #[tokio::test]
    async fn unknown_job_is_not_found() -> anyhow::Result<()> {
        let server = create_test_server_with_router(|_| routes())?;

        let response = server
            .get(&format!("/api/gpt-bypass/job/{}", Uuid::now_v7()))
            .await;
        response.assert_status_not_found();

        let response = server.get("/api/gpt-bypass/job/not-a-uuid").await;
        response.assert_status_bad_request();
        Ok(())
    }

    #[tokio::test]
    async fn chunk_text_uses_requested_size() -> anyhow::Result<()> {
        let server = create_test_server_with_router(|_| routes())?;

        let paragraph = "one two three four five six seven eight nine ten";
        let text = [paragraph; 3].join("\n\n");

        let response = server
            .post("/api/gpt-bypass/chunk-text")
            .json(&json!({ "text": text, "maxWords": 10 }))
            .await;
        response.assert_status_ok();

        let previews = response.json::<ChunkPreviews>();
        assert_eq!(previews.chunks.len(), 3);
        assert!(previews.chunks.iter().all(|chunk| chunk.word_count == 10));
        assert_eq!(previews.chunks[2].index, 2);
        Ok(())
    }
}
