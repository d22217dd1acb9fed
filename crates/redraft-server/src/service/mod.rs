//! Application state and dependency injection.

mod config;
mod processing_jobs;
mod rewrite_jobs;

use std::sync::Arc;

use redraft_core::ProviderRegistry;
use redraft_core::chunk::Chunker;
use redraft_core::detect::{AiDetector, DetectionService};
use redraft_core::pipeline::{Dispatcher, SequentialProcessor};
use redraft_core::transcribe::{Transcriber, TranscriptionService};

pub use crate::service::config::{ServiceConfig, ServiceConfigBuilder};
pub use crate::service::processing_jobs::{
    ChunkStatus, JobError, ProcessingJob, ProcessingJobs, RunRequest, RunSummary,
};
pub use crate::service::rewrite_jobs::{
    DEFAULT_MAX_REWRITE_JOBS, InMemoryRewriteJobs, RewriteJob, RewriteJobStore, RewriteJobs,
    RewriteStatus,
};
// Re-export error types from crate root for convenience
pub use crate::{Error, Result};

/// Tracing target for service state construction.
const TRACING_TARGET: &str = "redraft_server::service";

/// Application state.
///
/// Used for the [`State`] extraction (dependency injection).
///
/// [`State`]: axum::extract::State
#[must_use = "state does nothing unless you use it"]
#[derive(Clone)]
pub struct ServiceState {
    // Provider access:
    pub dispatcher: Dispatcher,
    pub detection: DetectionService,
    pub transcription: TranscriptionService,

    // Internal services:
    pub chunker: Chunker,
    pub rewrite_jobs: RewriteJobs,
    pub processing_jobs: ProcessingJobs,
}

impl ServiceState {
    /// Initializes application state from configuration.
    ///
    /// Builds the shared HTTP client and one adapter per configured vendor.
    pub fn from_config(config: &ServiceConfig) -> Result<Self> {
        config.validate()?;

        let client = config.connect_providers()?;
        let registry = config.providers.build_registry(&client);
        let detector = config.providers.build_detector(&client);
        let transcriber = config.providers.build_transcriber(&client);

        tracing::info!(
            target: TRACING_TARGET,
            providers = ?registry.available(),
            detector = detector.is_some(),
            transcriber = transcriber.is_some(),
            "Service state initialized"
        );

        Ok(Self::with_providers(config, registry, detector, transcriber))
    }

    /// Creates the state from already constructed providers.
    pub fn with_providers(
        config: &ServiceConfig,
        registry: ProviderRegistry,
        detector: Option<Arc<dyn AiDetector>>,
        transcriber: Option<Arc<dyn Transcriber>>,
    ) -> Self {
        let dispatcher = Dispatcher::new(registry.clone());
        let chunker = Chunker::new(config.chunker);
        let processor = SequentialProcessor::from_config(dispatcher.clone(), &config.processor);

        Self {
            detection: DetectionService::new(registry).with_shared_primary(detector),
            transcription: TranscriptionService::from_shared(transcriber)
                .with_timeout(config.providers.transcribe_timeout()),
            processing_jobs: ProcessingJobs::new(processor, chunker, config.max_processing_jobs),
            rewrite_jobs: InMemoryRewriteJobs::with_capacity(config.max_rewrite_jobs).shared(),
            dispatcher,
            chunker,
        }
    }
}

macro_rules! impl_di {
    ($($f:ident: $t:ty),+) => {$(
        impl axum::extract::FromRef<ServiceState> for $t {
            fn from_ref(state: &ServiceState) -> Self {
                state.$f.clone()
            }
        }
    )+};
}

// Provider access:
impl_di!(dispatcher: Dispatcher);
impl_di!(detection: DetectionService);
impl_di!(transcription: TranscriptionService);

// Internal services:
impl_di!(chunker: Chunker);
impl_di!(rewrite_jobs: RewriteJobs);
impl_di!(processing_jobs: ProcessingJobs);
