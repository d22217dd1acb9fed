//! Document processing jobs.
//!
//! A job holds a chunked document from submission until its run finishes.
//! Each run executes in its own task; the handler and the task share the job
//! through `Arc<RwLock<ProcessingJob>>`, so clients can poll state, progress
//! and the output accumulated so far.

use std::collections::HashMap;
use std::sync::Arc;

use jiff::Timestamp;
use redraft_core::ProviderKind;
use redraft_core::chunk::{Chunk, Chunker, Selection, join_chunks};
use redraft_core::pipeline::{
    JobState, ProcessingMode, ProcessingPlan, Progress, ProgressSink, RewriteOptions,
    SequentialProcessor,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

/// Tracing target for processing jobs.
const TRACING_TARGET: &str = "redraft_server::service::processing_jobs";

/// Where the current content of a chunk came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum ChunkStatus {
    /// Unchanged from the submitted document.
    Original,
    /// Rewritten by the provider.
    Rewritten,
    /// Generated and appended by the provider.
    Added,
}

/// Parameters of a run, kept for reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub mode: ProcessingMode,
    pub provider: ProviderKind,
    pub selected: Vec<usize>,
    pub add_count: usize,
}

/// A run requested by a client.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub mode: ProcessingMode,
    pub selection: Selection,
    pub add_count: usize,
    pub options: RewriteOptions,
}

/// A chunked document and the state of its run.
#[derive(Debug, Clone)]
pub struct ProcessingJob {
    pub id: Uuid,
    pub state: JobState,
    /// Current chunks: original, rewritten or appended.
    pub chunks: Vec<Chunk>,
    /// Origin of each entry of `chunks`.
    pub statuses: Vec<ChunkStatus>,
    pub run: Option<RunSummary>,
    pub progress: Progress,
    pub error: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    cancel: CancellationToken,
}

impl ProcessingJob {
    fn new() -> Self {
        let now = Timestamp::now();
        Self {
            id: Uuid::now_v7(),
            state: JobState::default(),
            chunks: Vec::new(),
            statuses: Vec::new(),
            run: None,
            progress: Progress::default(),
            error: None,
            created_at: now,
            updated_at: now,
            cancel: CancellationToken::new(),
        }
    }

    /// Returns the document as accumulated so far.
    pub fn output(&self) -> String {
        join_chunks(self.chunks.iter().map(|chunk| chunk.content.as_str()))
    }

    /// Returns true if the job can be dropped to make room.
    fn is_evictable(&self) -> bool {
        self.state.is_terminal() || (self.run.is_none() && self.state == JobState::AwaitingSelection)
    }

    /// Moves to `next`. Edges rejected by the state machine are logged and
    /// applied anyway, since the run task is authoritative.
    fn apply_state(&mut self, next: JobState) {
        if self.state == next {
            return;
        }

        if let Err(error) = self.state.transition(next) {
            tracing::warn!(
                target: TRACING_TARGET,
                job_id = %self.id,
                error = %error,
                "Forcing job state"
            );
            self.state = next;
        }
        self.updated_at = Timestamp::now();
    }
}

/// Errors of processing job operations.
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    /// No job has this identifier.
    #[error("processing job {0} not found")]
    NotFound(Uuid),
    /// The job is in a state that does not allow the operation.
    #[error("processing job is {state}: {reason}")]
    Conflict {
        state: &'static str,
        reason: &'static str,
    },
    /// Every slot is held by a running job.
    #[error("{0} processing jobs are active")]
    AtCapacity(usize),
    /// Chunking, selection or provider lookup failed.
    #[error(transparent)]
    Core(#[from] redraft_core::Error),
}

type SharedJob = Arc<RwLock<ProcessingJob>>;

/// Registry of processing jobs.
///
/// Holds at most `capacity` jobs. When full, the oldest jobs that are
/// finished or still waiting for a selection are evicted; running jobs are
/// never evicted.
#[derive(Debug, Clone)]
pub struct ProcessingJobs {
    jobs: Arc<RwLock<HashMap<Uuid, SharedJob>>>,
    processor: SequentialProcessor,
    chunker: Chunker,
    capacity: usize,
}

impl ProcessingJobs {
    /// Creates an empty registry.
    pub fn new(processor: SequentialProcessor, chunker: Chunker, capacity: usize) -> Self {
        Self {
            jobs: Arc::default(),
            processor,
            chunker,
            capacity: capacity.max(1),
        }
    }

    /// Chunks `text` into a new job awaiting selection.
    ///
    /// # Errors
    ///
    /// Returns an invalid input error if the text has no content, or
    /// [`JobError::AtCapacity`] if no slot can be freed.
    pub async fn create(&self, text: &str, chunker: Option<Chunker>) -> Result<ProcessingJob, JobError> {
        let mut job = ProcessingJob::new();
        job.apply_state(JobState::Chunking);

        let chunks = chunker.unwrap_or(self.chunker).chunk(text);
        if chunks.is_empty() {
            return Err(redraft_core::Error::invalid_input()
                .with_message("document has no text to process")
                .into());
        }

        job.statuses = vec![ChunkStatus::Original; chunks.len()];
        job.chunks = chunks;
        job.apply_state(JobState::AwaitingSelection);

        let mut jobs = self.jobs.write().await;
        if jobs.len() >= self.capacity {
            self.evict(&mut jobs).await?;
        }

        tracing::info!(
            target: TRACING_TARGET,
            job_id = %job.id,
            chunks = job.chunks.len(),
            "Processing job created"
        );

        jobs.insert(job.id, Arc::new(RwLock::new(job.clone())));
        Ok(job)
    }

    /// Returns a snapshot of a job.
    ///
    /// # Errors
    ///
    /// Returns [`JobError::NotFound`] for an unknown identifier.
    pub async fn get(&self, id: Uuid) -> Result<ProcessingJob, JobError> {
        let job = self.find(id).await?;
        let snapshot = job.read().await.clone();
        Ok(snapshot)
    }

    /// Resolves `selection` against the chunks of a job.
    ///
    /// # Errors
    ///
    /// Returns [`JobError::NotFound`] for an unknown identifier, or an
    /// invalid input error for an out-of-range selection.
    pub async fn resolve_selection(&self, id: Uuid, selection: &Selection) -> Result<Vec<usize>, JobError> {
        let job = self.find(id).await?;
        let chunk_count = job.read().await.chunks.len();
        Ok(selection.resolve(chunk_count)?)
    }

    /// Starts processing a job in the background.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the provider is missing, an invalid
    /// input error for a bad selection or plan, and [`JobError::Conflict`]
    /// if the job was already started or is finished.
    pub async fn start(&self, id: Uuid, request: RunRequest) -> Result<ProcessingJob, JobError> {
        let job = self.find(id).await?;
        self.processor
            .dispatcher()
            .registry()
            .get(request.options.provider)?;

        let mut guard = job.write().await;
        if guard.run.is_some() || guard.state != JobState::AwaitingSelection {
            return Err(JobError::Conflict {
                state: guard.state.name(),
                reason: "processing can only start once, while awaiting selection",
            });
        }

        let selected = if request.mode.rewrites() {
            request.selection.resolve(guard.chunks.len())?
        } else {
            Vec::new()
        };

        let plan = ProcessingPlan {
            mode: request.mode,
            selected,
            add_count: request.add_count,
            options: request.options,
        };
        plan.validate(guard.chunks.len())?;

        let total = plan.step_count();
        guard.run = Some(RunSummary {
            mode: plan.mode,
            provider: plan.options.provider,
            selected: plan.selected.clone(),
            add_count: plan.add_count,
        });
        guard.progress = Progress::new(0, total, None);
        guard.apply_state(JobState::Processing { index: 0, total });

        let chunks = guard.chunks.clone();
        let cancel = guard.cancel.clone();
        let snapshot = guard.clone();
        drop(guard);

        tracing::info!(
            target: TRACING_TARGET,
            job_id = %id,
            provider = %plan.options.provider,
            mode = ?plan.mode,
            steps = total,
            "Processing job started"
        );

        let processor = self.processor.clone();
        let span = tracing::info_span!(target: TRACING_TARGET, "processing_job", job_id = %id);
        tokio::spawn(
            async move {
                let sink = JobProgress { job: job.clone() };
                let outcome = processor.run(chunks, &plan, &sink, &cancel).await;

                let mut guard = job.write().await;
                let chunk_count = outcome.chunks.len();
                guard.statuses.resize(chunk_count, ChunkStatus::Added);
                guard.chunks = outcome.chunks;
                guard.error = outcome.error.map(|error| error.message_or_kind().to_owned());
                guard.apply_state(outcome.state);

                tracing::info!(
                    target: TRACING_TARGET,
                    state = guard.state.name(),
                    appended = outcome.appended,
                    "Processing job finished"
                );
            }
            .instrument(span),
        );

        Ok(snapshot)
    }

    /// Cancels a job.
    ///
    /// A job that was never started is cancelled immediately. A running job
    /// stops before its next provider request; the returned snapshot may
    /// still show it as processing.
    ///
    /// # Errors
    ///
    /// Returns [`JobError::NotFound`] for an unknown identifier and
    /// [`JobError::Conflict`] for a finished job.
    pub async fn cancel(&self, id: Uuid) -> Result<ProcessingJob, JobError> {
        let job = self.find(id).await?;
        let mut guard = job.write().await;

        if guard.state.is_terminal() {
            return Err(JobError::Conflict {
                state: guard.state.name(),
                reason: "a finished job cannot be cancelled",
            });
        }

        guard.cancel.cancel();
        if guard.run.is_none() {
            guard.apply_state(JobState::Cancelled);
        }

        tracing::info!(
            target: TRACING_TARGET,
            job_id = %id,
            state = guard.state.name(),
            "Processing job cancellation requested"
        );

        Ok(guard.clone())
    }

    /// Returns the number of jobs held.
    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    /// Returns true if no job is held.
    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }

    async fn find(&self, id: Uuid) -> Result<SharedJob, JobError> {
        self.jobs
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(JobError::NotFound(id))
    }

    /// Evicts the oldest evictable jobs until one slot is free.
    async fn evict(&self, jobs: &mut HashMap<Uuid, SharedJob>) -> Result<(), JobError> {
        let mut candidates = Vec::new();
        for (id, job) in jobs.iter() {
            let job = job.read().await;
            if job.is_evictable() {
                candidates.push((job.updated_at, *id));
            }
        }
        candidates.sort();

        let excess = jobs.len() + 1 - self.capacity;
        if candidates.len() < excess {
            tracing::warn!(
                target: TRACING_TARGET,
                capacity = self.capacity,
                "Processing job capacity reached"
            );
            return Err(JobError::AtCapacity(self.capacity));
        }

        for (_, id) in candidates.into_iter().take(excess) {
            jobs.remove(&id);
            tracing::debug!(
                target: TRACING_TARGET,
                job_id = %id,
                "Processing job evicted"
            );
        }

        Ok(())
    }
}

/// Writes run progress into the shared job.
struct JobProgress {
    job: SharedJob,
}

#[async_trait::async_trait]
impl ProgressSink for JobProgress {
    async fn step_started(&self, state: JobState) {
        self.job.write().await.apply_state(state);
    }

    async fn chunk_completed(&self, chunk: &Chunk, progress: Progress) {
        let mut job = self.job.write().await;
        if let Some(slot) = job.chunks.get_mut(chunk.index) {
            *slot = chunk.clone();
        }
        if let Some(status) = job.statuses.get_mut(chunk.index) {
            *status = ChunkStatus::Rewritten;
        }
        job.progress = progress;
        job.updated_at = Timestamp::now();
    }

    async fn chunks_appended(&self, chunks: &[Chunk], progress: Progress) {
        let mut job = self.job.write().await;
        job.chunks.extend_from_slice(chunks);
        let chunk_count = job.chunks.len();
        job.statuses.resize(chunk_count, ChunkStatus::Added);
        job.progress = progress;
        job.updated_at = Timestamp::now();
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use redraft_core::chunk::ChunkerConfig;
    use redraft_core::mock::MockProvider;
    use redraft_core::pipeline::Dispatcher;
    use redraft_core::provider::ProviderRegistry;

    use super::*;

    const DOCUMENT: &str = "First paragraph of the document.\n\nSecond paragraph here.\n\nThird and final paragraph.";

    fn registry(provider: MockProvider) -> ProcessingJobs {
        let registry = ProviderRegistry::new().with_provider(provider);
        let processor = SequentialProcessor::new(Dispatcher::new(registry), Duration::ZERO);
        ProcessingJobs::new(processor, Chunker::new(ChunkerConfig::fixed(5)), 2)
    }

    fn rewrite_all() -> RunRequest {
        RunRequest {
            mode: ProcessingMode::Rewrite,
            selection: Selection::All,
            add_count: 0,
            options: RewriteOptions::new(ProviderKind::OpenAi, "Rewrite"),
        }
    }

    async fn wait_until_finished(jobs: &ProcessingJobs, id: Uuid) -> anyhow::Result<ProcessingJob> {
        for _ in 0..200 {
            let job = jobs.get(id).await?;
            if job.state.is_terminal() {
                return Ok(job);
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        anyhow::bail!("job did not finish")
    }

    #[tokio::test]
    async fn create_chunks_document() -> anyhow::Result<()> {
        let jobs = registry(MockProvider::echo(ProviderKind::OpenAi));
        let job = jobs.create(DOCUMENT, None).await?;

        assert_eq!(job.state, JobState::AwaitingSelection);
        assert_eq!(job.chunks.len(), 3);
        assert!(job.statuses.iter().all(|s| *s == ChunkStatus::Original));
        assert!(matches!(
            jobs.create("   ", None).await,
            Err(JobError::Core(_))
        ));
        Ok(())
    }

    #[tokio::test]
    async fn run_rewrites_selected_chunks() -> anyhow::Result<()> {
        let jobs = registry(MockProvider::with_prefix(ProviderKind::OpenAi, "NEW "));
        let job = jobs.create(DOCUMENT, None).await?;

        let request = RunRequest {
            selection: Selection::Indices { indices: vec![1] },
            ..rewrite_all()
        };
        let started = jobs.start(job.id, request).await?;
        assert!(started.state.is_processing());

        let finished = wait_until_finished(&jobs, job.id).await?;
        assert_eq!(finished.state, JobState::Completed);
        assert_eq!(
            finished.statuses,
            vec![ChunkStatus::Original, ChunkStatus::Rewritten, ChunkStatus::Original]
        );
        assert!(finished.chunks[1].content.starts_with("NEW "));
        assert_eq!(finished.chunks[0].content, job.chunks[0].content);
        Ok(())
    }

    #[tokio::test]
    async fn start_twice_conflicts() -> anyhow::Result<()> {
        let jobs = registry(MockProvider::echo(ProviderKind::OpenAi));
        let job = jobs.create(DOCUMENT, None).await?;

        jobs.start(job.id, rewrite_all()).await?;
        assert!(matches!(
            jobs.start(job.id, rewrite_all()).await,
            Err(JobError::Conflict { .. })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn missing_provider_is_rejected_before_start() -> anyhow::Result<()> {
        let jobs = registry(MockProvider::echo(ProviderKind::OpenAi));
        let job = jobs.create(DOCUMENT, None).await?;

        let request = RunRequest {
            options: RewriteOptions::new(ProviderKind::Anthropic, "Rewrite"),
            ..rewrite_all()
        };
        assert!(matches!(jobs.start(job.id, request).await, Err(JobError::Core(_))));
        assert_eq!(jobs.get(job.id).await?.state, JobState::AwaitingSelection);
        Ok(())
    }

    #[tokio::test]
    async fn cancel_before_start() -> anyhow::Result<()> {
        let jobs = registry(MockProvider::echo(ProviderKind::OpenAi));
        let job = jobs.create(DOCUMENT, None).await?;

        let cancelled = jobs.cancel(job.id).await?;
        assert_eq!(cancelled.state, JobState::Cancelled);
        assert!(matches!(
            jobs.cancel(job.id).await,
            Err(JobError::Conflict { .. })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn failed_chunk_is_recorded() -> anyhow::Result<()> {
        let jobs = registry(MockProvider::echo(ProviderKind::OpenAi).fail_on_call(2));
        let job = jobs.create(DOCUMENT, None).await?;

        jobs.start(job.id, rewrite_all()).await?;
        let finished = wait_until_finished(&jobs, job.id).await?;

        assert_eq!(finished.state, JobState::Failed);
        assert!(finished.error.is_some_and(|e| e.contains("chunk 2 of 3")));
        assert_eq!(finished.statuses[0], ChunkStatus::Rewritten);
        assert_eq!(finished.statuses[2], ChunkStatus::Original);
        Ok(())
    }

    #[tokio::test]
    async fn oldest_idle_jobs_are_evicted() -> anyhow::Result<()> {
        let jobs = registry(MockProvider::echo(ProviderKind::OpenAi));
        let first = jobs.create(DOCUMENT, None).await?;
        let second = jobs.create(DOCUMENT, None).await?;
        let third = jobs.create(DOCUMENT, None).await?;

        assert_eq!(jobs.len().await, 2);
        assert!(matches!(jobs.get(first.id).await, Err(JobError::NotFound(_))));
        assert!(jobs.get(second.id).await.is_ok());
        assert!(jobs.get(third.id).await.is_ok());
        Ok(())
    }
}
