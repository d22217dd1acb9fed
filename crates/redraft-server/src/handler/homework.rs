//! Homework solving handler.

use aide::axum::ApiRouter;
use aide::transform::TransformOperation;
use axum::extract::State;
use axum::http::StatusCode;
use redraft_core::pipeline::Dispatcher;

use crate::extract::{Json, ValidateJson};
use crate::handler::Result;
use crate::handler::request::SolveHomework;
use crate::handler::response::{ErrorResponse, ProcessedText};
use crate::service::ServiceState;

/// Tracing target for homework solving.
const TRACING_TARGET: &str = "redraft_server::handler::homework";

/// Solves or answers an assignment.
#[tracing::instrument(skip_all, fields(provider = %request.llm_provider))]
async fn solve_homework(
    State(dispatcher): State<Dispatcher>,
    ValidateJson(request): ValidateJson<SolveHomework>,
) -> Result<(StatusCode, Json<ProcessedText>)> {
    tracing::debug!(
        target: TRACING_TARGET,
        assignment_chars = request.assignment_text.len(),
        "Solving assignment"
    );

    let result = dispatcher
        .solve_homework(
            request.llm_provider,
            &request.assignment_text,
            request.special_instructions.as_deref(),
        )
        .await?;

    Ok((StatusCode::OK, Json(ProcessedText::new(result))))
}

fn solve_homework_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Solve homework")
        .description("Answers the assignment with the selected provider.")
        .response::<200, Json<ProcessedText>>()
        .response::<400, Json<ErrorResponse>>()
        .response::<502, Json<ErrorResponse>>()
        .response::<503, Json<ErrorResponse>>()
        .response::<504, Json<ErrorResponse>>()
}

/// Returns a [`Router`] with the homework route.
///
/// [`Router`]: axum::routing::Router
pub fn routes() -> ApiRouter<ServiceState> {
    use aide::axum::routing::*;

    ApiRouter::new()
        .api_route("/api/solve-homework", post_with(solve_homework, solve_homework_docs))
        .with_path_items(|item| item.tag("Homework"))
}
