//! OpenAI Whisper transcription.

use std::time::Duration;

use redraft_core::transcribe::{AudioInput, DEFAULT_TRANSCRIBE_TIMEOUT, Transcriber, Transcript};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;

use crate::ReqwestClient;
use crate::error::Error;

/// Tracing target for transcription requests.
const TRACING_TARGET: &str = "redraft_reqwest::transcribe";

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

/// Adapter for the OpenAI audio transcription API.
#[derive(Clone)]
pub struct WhisperTranscriber {
    client: ReqwestClient,
    endpoint: String,
    api_key: String,
    model: String,
    timeout: Duration,
}

impl std::fmt::Debug for WhisperTranscriber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WhisperTranscriber")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl WhisperTranscriber {
    /// Default transcription endpoint.
    pub const ENDPOINT: &'static str = "https://api.openai.com/v1/audio/transcriptions";
    /// Default model.
    pub const DEFAULT_MODEL: &'static str = "whisper-1";

    /// Creates a transcriber with the default endpoint and model.
    pub fn new(client: ReqwestClient, api_key: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: Self::ENDPOINT.to_owned(),
            api_key: api_key.into(),
            model: Self::DEFAULT_MODEL.to_owned(),
            timeout: DEFAULT_TRANSCRIBE_TIMEOUT,
        }
    }

    /// Sets the HTTP timeout of a transcription request.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn form(&self, audio: AudioInput) -> Result<Form, Error> {
        let mut part = Part::bytes(audio.bytes.to_vec()).file_name(audio.file_name);
        if let Some(content_type) = audio.content_type.as_deref() {
            part = part.mime_str(content_type)?;
        }

        Ok(Form::new()
            .text("model", self.model.clone())
            .text("response_format", "json")
            .part("file", part))
    }
}

#[async_trait::async_trait]
impl Transcriber for WhisperTranscriber {
    fn name(&self) -> &str {
        "whisper"
    }

    async fn transcribe(&self, audio: AudioInput) -> redraft_core::Result<Transcript> {
        tracing::debug!(
            target: TRACING_TARGET,
            model = %self.model,
            size = audio.bytes.len(),
            "Requesting transcription"
        );

        let form = self.form(audio)?;
        let http_request = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key);

        let response: TranscriptionResponse = self
            .client
            .send_multipart(http_request, form, self.timeout)
            .await?;

        Ok(Transcript {
            text: response.text.trim().to_owned(),
        })
    }
}
