//! Audio transcription handler.

use aide::axum::ApiRouter;
use aide::transform::TransformOperation;
use axum::extract::State;
use axum::http::StatusCode;
use redraft_core::transcribe::{AudioInput, TranscriptionService};

use crate::extract::{Json, Multipart};
use crate::handler::response::{ErrorResponse, ProcessedText};
use crate::handler::{Error, Result};
use crate::service::ServiceState;

/// Tracing target for transcription.
const TRACING_TARGET: &str = "redraft_server::handler::transcription";

/// Name of the multipart field carrying the recording.
const AUDIO_FIELD: &str = "audio";

/// Fallback file name for uploads without one.
const DEFAULT_FILE_NAME: &str = "audio.webm";

/// Transcribes an uploaded recording.
#[tracing::instrument(skip_all)]
async fn transcribe(
    State(transcription): State<TranscriptionService>,
    Multipart(mut multipart): Multipart,
) -> Result<(StatusCode, Json<ProcessedText>)> {
    let mut audio = None;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(AUDIO_FIELD) {
            continue;
        }

        let file_name = field.file_name().unwrap_or(DEFAULT_FILE_NAME).to_owned();
        let content_type = field.content_type().map(ToOwned::to_owned);
        let bytes = field.bytes().await?;

        let mut input = AudioInput::new(bytes, file_name);
        if let Some(content_type) = content_type {
            input = input.with_content_type(content_type);
        }
        audio = Some(input);
        break;
    }

    let Some(audio) = audio else {
        return Err(Error::bad_request(AUDIO_FIELD, "No audio file provided"));
    };

    tracing::debug!(
        target: TRACING_TARGET,
        file_name = %audio.file_name,
        size = audio.bytes.len(),
        "Audio received"
    );

    let transcript = transcription.transcribe(audio).await?;

    tracing::info!(
        target: TRACING_TARGET,
        text_chars = transcript.text.len(),
        "Audio transcribed"
    );

    Ok((StatusCode::OK, Json(ProcessedText::new(transcript.text))))
}

fn transcribe_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Transcribe audio")
        .description("Transcribes the recording uploaded in the `audio` multipart field.")
        .response::<200, Json<ProcessedText>>()
        .response::<400, Json<ErrorResponse>>()
        .response::<413, Json<ErrorResponse>>()
        .response::<502, Json<ErrorResponse>>()
        .response::<503, Json<ErrorResponse>>()
        .response::<504, Json<ErrorResponse>>()
}

/// Returns a [`Router`] with the transcription route.
///
/// [`Router`]: axum::routing::Router
pub fn routes() -> ApiRouter<ServiceState> {
    use aide::axum::routing::*;

    ApiRouter::new()
        .api_route("/api/transcribe", post_with(transcribe, transcribe_docs))
        .with_path_items(|item| item.tag("Transcription"))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum_test::multipart::{MultipartForm, Part};
    use redraft_core::mock::MockTranscriber;

    use super::*;
    use crate::handler::test::{create_test_server_with_state, test_state_with};

    fn audio_form(field: &str) -> MultipartForm {
        let part = Part::bytes(vec![1_u8, 2, 3, 4])
            .file_name("note.mp3")
            .mime_type("audio/mpeg");
        MultipartForm::new().add_part(field, part)
    }

    #[tokio::test]
    async fn transcribes_audio_field() -> anyhow::Result<()> {
        let state = test_state_with(None, Some(Arc::new(MockTranscriber::new("hello there"))));
        let server = create_test_server_with_state(|_| routes(), state)?;

        let response = server
            .post("/api/transcribe")
            .multipart(audio_form(AUDIO_FIELD))
            .await;
        response.assert_status_ok();

        let body = response.json::<ProcessedText>();
        assert_eq!(body.result, "hello there");
        Ok(())
    }

    #[tokio::test]
    async fn missing_audio_field_is_rejected() -> anyhow::Result<()> {
        let state = test_state_with(None, Some(Arc::new(MockTranscriber::new("unused"))));
        let server = create_test_server_with_state(|_| routes(), state)?;

        let response = server
            .post("/api/transcribe")
            .multipart(audio_form("file"))
            .await;
        response.assert_status_bad_request();

        let body = response.json::<serde_json::Value>();
        assert_eq!(body["resource"], AUDIO_FIELD);
        Ok(())
    }

    #[tokio::test]
    async fn unconfigured_transcriber_is_unavailable() -> anyhow::Result<()> {
        let server = create_test_server_with_state(|_| routes(), test_state_with(None, None))?;

        let response = server
            .post("/api/transcribe")
            .multipart(audio_form(AUDIO_FIELD))
            .await;
        response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
        Ok(())
    }
}
