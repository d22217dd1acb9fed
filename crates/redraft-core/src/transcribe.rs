//! Audio transcription.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Tracing target for transcription operations.
pub const TRACING_TARGET: &str = "redraft_core::transcribe";

/// Default limit on a single transcription request.
pub const DEFAULT_TRANSCRIBE_TIMEOUT: Duration = Duration::from_secs(30);

/// An uploaded audio file.
#[derive(Debug, Clone)]
pub struct AudioInput {
    /// Raw file contents.
    pub bytes: Bytes,
    /// Original file name, used by vendors to infer the format.
    pub file_name: String,
    /// MIME type reported by the client.
    pub content_type: Option<String>,
}

impl AudioInput {
    /// Creates an input from raw bytes.
    pub fn new(bytes: impl Into<Bytes>, file_name: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            file_name: file_name.into(),
            content_type: None,
        }
    }

    /// Sets the MIME type.
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Returns true if the upload looks like audio.
    ///
    /// Uploads without a MIME type, or with a generic binary type, are
    /// accepted and left to the vendor.
    pub fn is_audio(&self) -> bool {
        match self.content_type.as_deref() {
            None | Some("application/octet-stream") => true,
            Some(mime) => mime.starts_with("audio/") || mime == "video/webm" || mime == "video/mp4",
        }
    }
}

/// Text recognized in an [`AudioInput`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    /// Recognized text.
    pub text: String,
}

/// A speech-to-text backend.
#[async_trait::async_trait]
pub trait Transcriber: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Transcribes `audio`.
    async fn transcribe(&self, audio: AudioInput) -> Result<Transcript>;
}

/// Validates uploads and bounds each transcription with a timeout.
#[derive(Clone)]
pub struct TranscriptionService {
    transcriber: Option<Arc<dyn Transcriber>>,
    timeout: Duration,
}

impl fmt::Debug for TranscriptionService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TranscriptionService")
            .field("transcriber", &self.transcriber.as_ref().map(|t| t.name().to_owned()))
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Default for TranscriptionService {
    fn default() -> Self {
        Self {
            transcriber: None,
            timeout: DEFAULT_TRANSCRIBE_TIMEOUT,
        }
    }
}

impl TranscriptionService {
    /// Creates a service around `transcriber`.
    pub fn new<T>(transcriber: T) -> Self
    where
        T: Transcriber + 'static,
    {
        Self::from_shared(Some(Arc::new(transcriber)))
    }

    /// Creates a service from a shared transcriber, if any.
    pub fn from_shared(transcriber: Option<Arc<dyn Transcriber>>) -> Self {
        Self {
            transcriber,
            ..Self::default()
        }
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns true if a transcriber is configured.
    pub fn is_configured(&self) -> bool {
        self.transcriber.is_some()
    }

    /// Transcribes `audio`.
    ///
    /// # Errors
    ///
    /// Returns an invalid input error for an empty or non-audio upload, a
    /// configuration error when no transcriber is set, and a timeout error
    /// when the backend does not answer in time.
    pub async fn transcribe(&self, audio: AudioInput) -> Result<Transcript> {
        if audio.bytes.is_empty() {
            return Err(Error::invalid_input().with_message("audio file is empty"));
        }
        if !audio.is_audio() {
            return Err(Error::invalid_input().with_message(format!(
                "unsupported audio type '{}'",
                audio.content_type.as_deref().unwrap_or_default()
            )));
        }

        let transcriber = self.transcriber.as_ref().ok_or_else(|| {
            Error::configuration().with_message("transcription is not configured: set OPENAI_API_KEY")
        })?;

        tracing::debug!(
            target: TRACING_TARGET,
            transcriber = transcriber.name(),
            file_name = %audio.file_name,
            size = audio.bytes.len(),
            "Transcribing audio"
        );

        match tokio::time::timeout(self.timeout, transcriber.transcribe(audio)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    target: TRACING_TARGET,
                    transcriber = transcriber.name(),
                    timeout_secs = self.timeout.as_secs(),
                    "Transcription timed out"
                );
                Err(Error::timeout().with_message(format!(
                    "transcription did not finish within {} seconds",
                    self.timeout.as_secs()
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use crate::mock::MockTranscriber;

    fn audio() -> AudioInput {
        AudioInput::new(vec![1u8, 2, 3], "note.webm").with_content_type("audio/webm")
    }

    #[tokio::test]
    async fn returns_transcript() -> anyhow::Result<()> {
        let service = TranscriptionService::new(MockTranscriber::new("hello there"));
        let transcript = service.transcribe(audio()).await?;
        assert_eq!(transcript.text, "hello there");
        Ok(())
    }

    #[tokio::test]
    async fn rejects_empty_and_non_audio_uploads() {
        let service = TranscriptionService::new(MockTranscriber::new("unused"));

        let empty = AudioInput::new(Vec::<u8>::new(), "empty.mp3");
        assert_eq!(service.transcribe(empty).await.unwrap_err().kind, ErrorKind::InvalidInput);

        let text = AudioInput::new(vec![1u8], "notes.txt").with_content_type("text/plain");
        assert_eq!(service.transcribe(text).await.unwrap_err().kind, ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn missing_transcriber_is_a_configuration_error() {
        let service = TranscriptionService::default();
        let error = service.transcribe(audio()).await.unwrap_err();
        assert_eq!(error.kind, ErrorKind::Configuration);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_backend_times_out() {
        let transcriber = MockTranscriber::new("late").with_latency(Duration::from_secs(45));
        let service = TranscriptionService::new(transcriber);

        let error = service.transcribe(audio()).await.unwrap_err();
        assert_eq!(error.kind, ErrorKind::Timeout);
    }
}
