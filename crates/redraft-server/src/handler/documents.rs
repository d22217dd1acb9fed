//! Document processing job handlers.
//!
//! A document is chunked on submission and waits for the client to choose
//! which chunks to process. Starting a job returns immediately; clients poll
//! the job to follow progress and read the accumulated output.

use aide::axum::ApiRouter;
use aide::transform::TransformOperation;
use axum::extract::State;
use axum::http::StatusCode;
use redraft_core::chunk::{Chunker, ChunkerConfig};

use crate::extract::{Json, Path, ValidateJson};
use crate::handler::Result;
use crate::handler::request::{CreateDocument, DocumentPathParams, ResolveSelection, StartProcessing};
use crate::handler::response::{DocumentJob, ErrorResponse, ResolvedSelection};
use crate::service::{ProcessingJobs, RunRequest, ServiceState};

/// Tracing target for document processing jobs.
const TRACING_TARGET: &str = "redraft_server::handler::documents";

/// Chunks a document into a new job.
#[tracing::instrument(skip_all, fields(max_words = request.max_words))]
async fn create_document(
    State(processing_jobs): State<ProcessingJobs>,
    ValidateJson(request): ValidateJson<CreateDocument>,
) -> Result<(StatusCode, Json<DocumentJob>)> {
    let chunker = request
        .max_words
        .map(|words| Chunker::new(ChunkerConfig::fixed(words)));

    let job = processing_jobs.create(&request.text, chunker).await?;

    tracing::debug!(
        target: TRACING_TARGET,
        job_id = %job.id,
        chunks = job.chunks.len(),
        "Document submitted"
    );

    Ok((StatusCode::CREATED, Json(job.into())))
}

fn create_document_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Submit document")
        .description(
            "Splits the document into chunks and creates a job awaiting selection. The job \
             lists every chunk with its word count and preview.",
        )
        .response::<201, Json<DocumentJob>>()
        .response::<400, Json<ErrorResponse>>()
        .response::<429, Json<ErrorResponse>>()
}

/// Returns a job with its progress and output so far.
#[tracing::instrument(skip_all, fields(job_id = %path_params.job_id))]
async fn get_document(
    State(processing_jobs): State<ProcessingJobs>,
    Path(path_params): Path<DocumentPathParams>,
) -> Result<(StatusCode, Json<DocumentJob>)> {
    let job = processing_jobs.get(path_params.job_id).await?;
    Ok((StatusCode::OK, Json(job.into())))
}

fn get_document_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Get document job")
        .description("Returns the job state, progress, chunks and the accumulated output.")
        .response::<200, Json<DocumentJob>>()
        .response::<400, Json<ErrorResponse>>()
        .response::<404, Json<ErrorResponse>>()
}

/// Resolves a selection against the chunks of a job.
#[tracing::instrument(skip_all, fields(job_id = %path_params.job_id))]
async fn resolve_selection(
    State(processing_jobs): State<ProcessingJobs>,
    Path(path_params): Path<DocumentPathParams>,
    Json(request): Json<ResolveSelection>,
) -> Result<(StatusCode, Json<ResolvedSelection>)> {
    let indices = processing_jobs
        .resolve_selection(path_params.job_id, &request.selection)
        .await?;

    Ok((StatusCode::OK, Json(ResolvedSelection { indices })))
}

fn resolve_selection_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Resolve selection")
        .description(
            "Returns the sorted chunk indices a selection refers to, without starting the job.",
        )
        .response::<200, Json<ResolvedSelection>>()
        .response::<400, Json<ErrorResponse>>()
        .response::<404, Json<ErrorResponse>>()
}

/// Starts sequential processing of a job.
#[tracing::instrument(
    skip_all,
    fields(
        job_id = %path_params.job_id,
        provider = %request.llm_provider,
        mode = ?request.mode,
    )
)]
async fn start_processing(
    State(processing_jobs): State<ProcessingJobs>,
    Path(path_params): Path<DocumentPathParams>,
    ValidateJson(request): ValidateJson<StartProcessing>,
) -> Result<(StatusCode, Json<DocumentJob>)> {
    let run = RunRequest {
        mode: request.mode,
        add_count: request.add_count(),
        options: request.options(),
        selection: request.selection,
    };

    let job = processing_jobs.start(path_params.job_id, run).await?;

    tracing::debug!(
        target: TRACING_TARGET,
        steps = job.progress.total,
        "Document processing accepted"
    );

    Ok((StatusCode::ACCEPTED, Json(job.into())))
}

fn start_processing_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Start processing")
        .description(
            "Rewrites the selected chunks one at a time, appends new chunks, or both. \
             Returns immediately; poll the job to follow progress.",
        )
        .response::<202, Json<DocumentJob>>()
        .response::<400, Json<ErrorResponse>>()
        .response::<404, Json<ErrorResponse>>()
        .response::<409, Json<ErrorResponse>>()
        .response::<503, Json<ErrorResponse>>()
}

/// Requests cancellation of a job.
#[tracing::instrument(skip_all, fields(job_id = %path_params.job_id))]
async fn cancel_processing(
    State(processing_jobs): State<ProcessingJobs>,
    Path(path_params): Path<DocumentPathParams>,
) -> Result<(StatusCode, Json<DocumentJob>)> {
    let job = processing_jobs.cancel(path_params.job_id).await?;
    Ok((StatusCode::OK, Json(job.into())))
}

fn cancel_processing_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Cancel processing")
        .description(
            "Cancels the job. A running job stops before its next provider request and keeps \
             the chunks finished so far.",
        )
        .response::<200, Json<DocumentJob>>()
        .response::<400, Json<ErrorResponse>>()
        .response::<404, Json<ErrorResponse>>()
        .response::<409, Json<ErrorResponse>>()
}

/// Returns a [`Router`] with all document processing routes.
///
/// [`Router`]: axum::routing::Router
pub fn routes() -> ApiRouter<ServiceState> {
    use aide::axum::routing::*;

    ApiRouter::new()
        .api_route(
            "/api/documents",
            post_with(create_document, create_document_docs),
        )
        .api_route(
            "/api/documents/{jobId}",
            get_with(get_document, get_document_docs),
        )
        .api_route(
            "/api/documents/{jobId}/selection",
            post_with(resolve_selection, resolve_selection_docs),
        )
        .api_route(
            "/api/documents/{jobId}/start",
            post_with(start_processing, start_processing_docs),
        )
        .api_route(
            "/api/documents/{jobId}/cancel",
            post_with(cancel_processing, cancel_processing_docs),
        )
        .with_path_items(|item| item.tag("Documents"))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum_test::TestServer;
    use redraft_core::mock::MockProvider;
    use redraft_core::pipeline::JobState;
    use redraft_core::{ProviderKind, ProviderRegistry};
    use serde_json::json;
    use uuid::Uuid;

    use super::*;
    use crate::handler::test::{
        create_test_server_with_router, create_test_server_with_state, test_state_from_registry,
    };
    use crate::service::ChunkStatus;

    const DOCUMENT: &str = "alpha beta gamma delta epsilon zeta eta theta\n\n\
                            iota kappa lambda mu nu xi omicron pi\n\n\
                            rho sigma tau upsilon phi chi psi omega";

    async fn submit(server: &TestServer) -> DocumentJob {
        let response = server
            .post("/api/documents")
            .json(&json!({ "text": DOCUMENT, "maxWords": 10 }))
            .await;
        response.assert_status(StatusCode::CREATED);
        response.json::<DocumentJob>()
    }

    async fn wait_until_finished(server: &TestServer, job_id: Uuid) -> anyhow::Result<DocumentJob> {
        for _ in 0..200 {
            let job = server
                .get(&format!("/api/documents/{job_id}"))
                .await
                .json::<DocumentJob>();
            if job.status.is_terminal() {
                return Ok(job);
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        anyhow::bail!("job {job_id} did not finish")
    }

    #[tokio::test]
    async fn submitted_document_awaits_selection() -> anyhow::Result<()> {
        let server = create_test_server_with_router(|_| routes())?;

        let job = submit(&server).await;
        assert_eq!(job.status, JobState::AwaitingSelection);
        assert_eq!(job.chunks.len(), 3);
        assert!(job.chunks.iter().all(|c| c.status == ChunkStatus::Original));
        assert!(job.mode.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn selection_resolves_without_starting() -> anyhow::Result<()> {
        let server = create_test_server_with_router(|_| routes())?;
        let job = submit(&server).await;

        let response = server
            .post(&format!("/api/documents/{}/selection", job.job_id))
            .json(&json!({ "selection": { "type": "indices", "indices": [2, 0, 2] } }))
            .await;
        response.assert_status_ok();
        assert_eq!(response.json::<ResolvedSelection>().indices, vec![0, 2]);

        let response = server
            .post(&format!("/api/documents/{}/selection", job.job_id))
            .json(&json!({ "selection": { "type": "range", "start": 1, "end": 7 } }))
            .await;
        response.assert_status_bad_request();

        let job = server
            .get(&format!("/api/documents/{}", job.job_id))
            .await
            .json::<DocumentJob>();
        assert_eq!(job.status, JobState::AwaitingSelection);
        Ok(())
    }

    #[tokio::test]
    async fn start_rewrites_selected_chunks() -> anyhow::Result<()> {
        let server = create_test_server_with_router(|_| routes())?;
        let job = submit(&server).await;

        let response = server
            .post(&format!("/api/documents/{}/start", job.job_id))
            .json(&json!({
                "mode": "rewrite",
                "selection": { "type": "indices", "indices": [1] },
                "instructions": "Rewrite",
                "llmProvider": "anthropic",
            }))
            .await;
        response.assert_status(StatusCode::ACCEPTED);

        let started = response.json::<DocumentJob>();
        assert_eq!(started.selected, vec![1]);
        assert_eq!(started.progress.total, 1);

        let finished = wait_until_finished(&server, job.job_id).await?;
        assert_eq!(finished.status, JobState::Completed);
        assert_eq!(finished.chunks[0].status, ChunkStatus::Original);
        assert_eq!(finished.chunks[1].status, ChunkStatus::Rewritten);
        assert_eq!(finished.chunks[2].status, ChunkStatus::Original);
        assert!(finished.output.starts_with("alpha beta"));
        Ok(())
    }

    #[tokio::test]
    async fn second_start_conflicts() -> anyhow::Result<()> {
        let server = create_test_server_with_router(|_| routes())?;
        let job = submit(&server).await;
        let body = json!({ "instructions": "Rewrite", "llmProvider": "openai" });

        server
            .post(&format!("/api/documents/{}/start", job.job_id))
            .json(&body)
            .await
            .assert_status(StatusCode::ACCEPTED);

        let response = server
            .post(&format!("/api/documents/{}/start", job.job_id))
            .json(&body)
            .await;
        response.assert_status(StatusCode::CONFLICT);
        Ok(())
    }

    #[tokio::test]
    async fn cancel_before_start() -> anyhow::Result<()> {
        let server = create_test_server_with_router(|_| routes())?;
        let job = submit(&server).await;

        let response = server
            .post(&format!("/api/documents/{}/cancel", job.job_id))
            .await;
        response.assert_status_ok();
        assert_eq!(response.json::<DocumentJob>().status, JobState::Cancelled);

        let response = server
            .post(&format!("/api/documents/{}/cancel", job.job_id))
            .await;
        response.assert_status(StatusCode::CONFLICT);
        Ok(())
    }

    #[tokio::test]
    async fn add_mode_appends_generated_chunks() -> anyhow::Result<()> {
        let server = create_test_server_with_router(|_| routes())?;
        let job = submit(&server).await;

        let response = server
            .post(&format!("/api/documents/{}/start", job.job_id))
            .json(&json!({
                "mode": "add",
                "addCount": 2,
                "instructions": "Continue",
                "llmProvider": "openai",
            }))
            .await;
        response.assert_status(StatusCode::ACCEPTED);
        assert_eq!(response.json::<DocumentJob>().progress.total, 1);

        let finished = wait_until_finished(&server, job.job_id).await?;
        assert_eq!(finished.status, JobState::Completed);
        let statuses: Vec<ChunkStatus> = finished.chunks.iter().map(|c| c.status).collect();
        assert_eq!(
            statuses,
            vec![
                ChunkStatus::Original,
                ChunkStatus::Original,
                ChunkStatus::Original,
                ChunkStatus::Added,
                ChunkStatus::Added,
            ]
        );
        assert_eq!(finished.chunks[4].index, 4);
        Ok(())
    }

    #[tokio::test]
    async fn both_mode_rewrites_then_appends() -> anyhow::Result<()> {
        let provider = MockProvider::with_prefix(ProviderKind::Anthropic, "NEW ");
        let state = test_state_from_registry(ProviderRegistry::new().with_provider(provider.clone()));
        let server = create_test_server_with_state(|_| routes(), state)?;
        let job = submit(&server).await;

        let response = server
            .post(&format!("/api/documents/{}/start", job.job_id))
            .json(&json!({
                "mode": "both",
                "selection": { "type": "indices", "indices": [0] },
                "addCount": 1,
                "instructions": "Rewrite and continue",
                "llmProvider": "anthropic",
            }))
            .await;
        response.assert_status(StatusCode::ACCEPTED);
        assert_eq!(response.json::<DocumentJob>().progress.total, 2);

        let finished = wait_until_finished(&server, job.job_id).await?;
        assert_eq!(finished.status, JobState::Completed);
        assert_eq!(finished.chunks.len(), 4);
        assert_eq!(finished.chunks[0].status, ChunkStatus::Rewritten);
        assert_eq!(finished.chunks[1].status, ChunkStatus::Original);
        assert_eq!(finished.chunks[3].status, ChunkStatus::Added);
        assert!(finished.output.starts_with("NEW alpha"));
        assert_eq!(provider.calls(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn add_count_out_of_range_is_rejected() -> anyhow::Result<()> {
        let server = create_test_server_with_router(|_| routes())?;
        let job = submit(&server).await;

        for add_count in [0, 51] {
            let response = server
                .post(&format!("/api/documents/{}/start", job.job_id))
                .json(&json!({
                    "mode": "add",
                    "addCount": add_count,
                    "llmProvider": "openai",
                }))
                .await;
            response.assert_status_bad_request();
        }

        let job = server
            .get(&format!("/api/documents/{}", job.job_id))
            .await
            .json::<DocumentJob>();
        assert_eq!(job.status, JobState::AwaitingSelection);
        Ok(())
    }

    #[tokio::test]
    async fn empty_selection_in_rewrite_mode_is_rejected() -> anyhow::Result<()> {
        let server = create_test_server_with_router(|_| routes())?;
        let job = submit(&server).await;

        let response = server
            .post(&format!("/api/documents/{}/start", job.job_id))
            .json(&json!({
                "mode": "rewrite",
                "selection": { "type": "indices", "indices": [] },
                "instructions": "Rewrite",
                "llmProvider": "openai",
            }))
            .await;
        response.assert_status_bad_request();

        let body = response.json::<serde_json::Value>();
        assert!(body["message"].as_str().is_some_and(|m| m.contains("no chunks selected")));
        Ok(())
    }

    #[tokio::test]
    async fn cancel_running_job_keeps_finished_chunks() -> anyhow::Result<()> {
        let provider = MockProvider::with_prefix(ProviderKind::OpenAi, "NEW ")
            .with_latency(Duration::from_millis(200));
        let state = test_state_from_registry(ProviderRegistry::new().with_provider(provider.clone()));
        let server = create_test_server_with_state(|_| routes(), state)?;
        let job = submit(&server).await;

        server
            .post(&format!("/api/documents/{}/start", job.job_id))
            .json(&json!({ "instructions": "Rewrite", "llmProvider": "openai" }))
            .await
            .assert_status(StatusCode::ACCEPTED);

        // Wait for the first chunk, then cancel while the second is in flight.
        let mut first_done = false;
        for _ in 0..100 {
            let current = server
                .get(&format!("/api/documents/{}", job.job_id))
                .await
                .json::<DocumentJob>();
            if current.chunks[0].status == ChunkStatus::Rewritten {
                first_done = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        anyhow::ensure!(first_done, "first chunk was never rewritten");

        server
            .post(&format!("/api/documents/{}/cancel", job.job_id))
            .await
            .assert_status_ok();

        let finished = wait_until_finished(&server, job.job_id).await?;
        assert_eq!(finished.status, JobState::Cancelled);
        assert_eq!(finished.chunks[0].status, ChunkStatus::Rewritten);
        assert_eq!(finished.chunks[1].status, ChunkStatus::Original);
        assert_eq!(finished.chunks[2].status, ChunkStatus::Original);
        assert!(finished.output.starts_with("NEW alpha"));
        assert!(finished.output.ends_with("psi omega"));
        assert!(provider.calls() < 3);
        Ok(())
    }

    #[tokio::test]
    async fn unknown_job_is_not_found() -> anyhow::Result<()> {
        let server = create_test_server_with_router(|_| routes())?;

        let response = server
            .get(&format!("/api/documents/{}", Uuid::now_v7()))
            .await;
        response.assert_status_not_found();
        Ok(())
    }
}
