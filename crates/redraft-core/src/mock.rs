//! Mock providers for testing.
//!
//! Available with the `test-utils` feature:
//!
//! ```toml
//! [dev-dependencies]
//! redraft-core = { workspace = true, features = ["test-utils"] }
//! ```
//!
//! [`MockProvider`] echoes the last user turn back (optionally prefixed), can
//! answer with a fixed reply, fail on a given call, or add latency.
//! [`MockDetector`] and [`MockTranscriber`] stand in for the auxiliary
//! services.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::detect::{AiDetector, DetectionResult, DetectionSource};
use crate::provider::{
    CompletionRequest, CompletionResponse, LanguageProvider, ProviderKind, ProviderLimits,
    TokenUsage,
};
use crate::transcribe::{AudioInput, Transcriber, Transcript};
use crate::{Error, Result};

#[derive(Debug, Clone)]
enum Reply {
    Echo { prefix: String },
    Fixed(String),
}

#[derive(Debug, Default)]
struct CallLog {
    calls: AtomicUsize,
    last_input: Mutex<Option<String>>,
}

/// A scripted [`LanguageProvider`].
///
/// Clones share the call counter, so a clone can be registered while the
/// original is kept for assertions.
#[derive(Debug, Clone)]
pub struct MockProvider {
    kind: ProviderKind,
    reply: Reply,
    fail_on_call: Option<usize>,
    latency: Duration,
    limits: Option<ProviderLimits>,
    log: Arc<CallLog>,
}

impl MockProvider {
    /// Creates a provider that returns the last user turn unchanged.
    pub fn echo(kind: ProviderKind) -> Self {
        Self::with_prefix(kind, "")
    }

    /// Creates a provider that returns the last user turn after `prefix`.
    pub fn with_prefix(kind: ProviderKind, prefix: impl Into<String>) -> Self {
        Self::new(
            kind,
            Reply::Echo {
                prefix: prefix.into(),
            },
        )
    }

    /// Creates a provider that always answers `reply`.
    pub fn fixed(kind: ProviderKind, reply: impl Into<String>) -> Self {
        Self::new(kind, Reply::Fixed(reply.into()))
    }

    fn new(kind: ProviderKind, reply: Reply) -> Self {
        Self {
            kind,
            reply,
            fail_on_call: None,
            latency: Duration::ZERO,
            limits: None,
            log: Arc::default(),
        }
    }

    /// Fails the `call`-th request (1-based) with an external error.
    #[must_use]
    pub fn fail_on_call(mut self, call: usize) -> Self {
        self.fail_on_call = Some(call);
        self
    }

    /// Sleeps `latency` before answering.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Overrides the provider limits.
    #[must_use]
    pub fn with_limits(mut self, limits: ProviderLimits) -> Self {
        self.limits = Some(limits);
        self
    }

    /// Number of requests received so far.
    pub fn calls(&self) -> usize {
        self.log.calls.load(Ordering::SeqCst)
    }

    /// Last user turn received.
    pub fn last_input(&self) -> Option<String> {
        self.log.last_input.lock().ok().and_then(|input| input.clone())
    }
}

#[async_trait::async_trait]
impl LanguageProvider for MockProvider {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    fn limits(&self) -> ProviderLimits {
        self.limits.unwrap_or_else(|| self.kind.default_limits())
    }

    fn model(&self) -> &str {
        "mock"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse> {
        let call = self.log.calls.fetch_add(1, Ordering::SeqCst) + 1;
        let input = request.last_user_content().unwrap_or_default().to_owned();
        if let Ok(mut last_input) = self.log.last_input.lock() {
            *last_input = Some(input.clone());
        }

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        if self.fail_on_call == Some(call) {
            return Err(Error::external_error()
                .with_provider(self.kind)
                .with_message("mock failure"));
        }

        let content = match &self.reply {
            Reply::Echo { prefix } => format!("{prefix}{input}"),
            Reply::Fixed(reply) => reply.clone(),
        };

        let usage = TokenUsage {
            input_tokens: u32::try_from(request.estimated_tokens()).unwrap_or(u32::MAX),
            output_tokens: u32::try_from(crate::text::estimate_tokens(&content))
                .unwrap_or(u32::MAX),
        };

        Ok(CompletionResponse::new(content)
            .with_model("mock")
            .with_usage(usage))
    }
}

/// A detector returning a fixed probability, or always failing.
#[derive(Debug, Clone)]
pub struct MockDetector {
    probability: Option<f64>,
}

impl MockDetector {
    /// Creates a detector scoring every text with `probability`.
    pub fn new(probability: f64) -> Self {
        Self {
            probability: Some(probability),
        }
    }

    /// Creates a detector whose every call fails.
    pub fn failing() -> Self {
        Self { probability: None }
    }
}

#[async_trait::async_trait]
impl AiDetector for MockDetector {
    fn name(&self) -> &str {
        "mock-detector"
    }

    async fn detect(&self, _text: &str) -> Result<DetectionResult> {
        let probability = self
            .probability
            .ok_or_else(|| Error::network_error().with_message("mock detector unavailable"))?;

        Ok(DetectionResult::new(
            probability >= 0.5,
            probability,
            format!("{:.0}% probability of AI generation", probability * 100.0),
            DetectionSource::Detector,
        ))
    }
}

/// A transcriber returning a fixed transcript.
#[derive(Debug, Clone)]
pub struct MockTranscriber {
    text: String,
    latency: Duration,
}

impl MockTranscriber {
    /// Creates a transcriber answering `text`.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            latency: Duration::ZERO,
        }
    }

    /// Sleeps `latency` before answering.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }
}

#[async_trait::async_trait]
impl Transcriber for MockTranscriber {
    fn name(&self) -> &str {
        "mock-transcriber"
    }

    async fn transcribe(&self, _audio: AudioInput) -> Result<Transcript> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        Ok(Transcript {
            text: self.text.clone(),
        })
    }
}
