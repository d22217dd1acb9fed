//! Chat handler.

use aide::axum::ApiRouter;
use aide::transform::TransformOperation;
use axum::extract::State;
use axum::http::StatusCode;
use redraft_core::pipeline::Dispatcher;

use crate::extract::{Json, ValidateJson};
use crate::handler::Result;
use crate::handler::request::SendChatMessage;
use crate::handler::response::{ChatReply, ErrorResponse};
use crate::service::ServiceState;

/// Tracing target for chat.
const TRACING_TARGET: &str = "redraft_server::handler::chat";

/// Continues a conversation, optionally grounded in a document.
#[tracing::instrument(
    skip_all,
    fields(
        provider = %request.llm_provider,
        history = request.conversation_history.len(),
    )
)]
async fn send_message(
    State(dispatcher): State<Dispatcher>,
    ValidateJson(request): ValidateJson<SendChatMessage>,
) -> Result<(StatusCode, Json<ChatReply>)> {
    let response = dispatcher
        .chat(
            request.llm_provider,
            &request.conversation_history,
            &request.message,
            request.context_document.as_deref(),
        )
        .await?;

    tracing::debug!(
        target: TRACING_TARGET,
        reply_chars = response.len(),
        "Chat reply generated"
    );

    Ok((StatusCode::OK, Json(ChatReply { response })))
}

fn send_message_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Send chat message")
        .description(
            "Sends the message with the previous turns to the selected provider. An optional \
             context document is added to the system prompt.",
        )
        .response::<200, Json<ChatReply>>()
        .response::<400, Json<ErrorResponse>>()
        .response::<502, Json<ErrorResponse>>()
        .response::<503, Json<ErrorResponse>>()
}

/// Returns a [`Router`] with the chat route.
///
/// [`Router`]: axum::routing::Router
pub fn routes() -> ApiRouter<ServiceState> {
    use aide::axum::routing::*;

    ApiRouter::new()
        .api_route("/api/chat", post_with(send_message, send_message_docs))
        .with_path_items(|item| item.tag("Chat"))
}
