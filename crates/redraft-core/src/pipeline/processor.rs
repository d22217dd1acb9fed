//! Sequential chunk processing.

use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use super::{Dispatcher, JobState, RewriteOptions, TRACING_TARGET};
use crate::chunk::{Chunk, align_offsets, count_words, join_chunks};
use crate::provider::ProviderKind;
use crate::{Error, Result};

/// Default pause between two provider requests of the same job, in seconds.
const DEFAULT_CHUNK_DELAY_SECS: u64 = 15;

fn default_chunk_delay_secs() -> u64 {
    DEFAULT_CHUNK_DELAY_SECS
}

/// Pacing of the [`SequentialProcessor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct ProcessorConfig {
    /// Seconds to wait between two chunks of the same job.
    #[cfg_attr(
        feature = "config",
        arg(long = "chunk-delay-secs", env = "CHUNK_DELAY_SECS", default_value = "15")
    )]
    #[serde(default = "default_chunk_delay_secs")]
    pub chunk_delay_secs: u64,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            chunk_delay_secs: DEFAULT_CHUNK_DELAY_SECS,
        }
    }
}

impl ProcessorConfig {
    /// Sets the inter-chunk delay in seconds.
    #[must_use]
    pub const fn with_chunk_delay_secs(mut self, secs: u64) -> Self {
        self.chunk_delay_secs = secs;
        self
    }

    /// Returns the inter-chunk delay.
    pub const fn chunk_delay(&self) -> Duration {
        Duration::from_secs(self.chunk_delay_secs)
    }
}

/// How a run treats the document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
#[serde(rename_all = "camelCase")]
pub enum ProcessingMode {
    /// Rewrite the selected chunks in place.
    #[default]
    Rewrite,
    /// Append new chunks generated from the whole document.
    Add,
    /// Rewrite the selected chunks, then append new chunks.
    Both,
}

impl ProcessingMode {
    /// Returns true if the run rewrites selected chunks.
    pub const fn rewrites(self) -> bool {
        matches!(self, Self::Rewrite | Self::Both)
    }

    /// Returns true if the run appends new chunks.
    pub const fn adds(self) -> bool {
        matches!(self, Self::Add | Self::Both)
    }
}

/// Everything a run needs besides the chunks themselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessingPlan {
    /// Rewrite, add or both.
    pub mode: ProcessingMode,
    /// Sorted, deduplicated chunk indices to rewrite.
    pub selected: Vec<usize>,
    /// Number of chunks to append in `add` and `both` modes.
    pub add_count: usize,
    /// Provider, instructions and sources.
    pub options: RewriteOptions,
}

impl ProcessingPlan {
    /// Creates a plan that rewrites `selected`, sorted and deduplicated.
    pub fn rewrite(mut selected: Vec<usize>, options: RewriteOptions) -> Self {
        selected.sort_unstable();
        selected.dedup();
        Self {
            mode: ProcessingMode::Rewrite,
            selected,
            add_count: 0,
            options,
        }
    }

    /// Number of provider requests the run will make.
    pub fn step_count(&self) -> usize {
        let rewrites = if self.mode.rewrites() {
            self.selected.len()
        } else {
            0
        };
        rewrites + usize::from(self.mode.adds())
    }

    /// Checks the plan against a document of `chunk_count` chunks.
    ///
    /// # Errors
    ///
    /// Returns an invalid input error if a selected index is out of range or
    /// repeated, the selection is unsorted, an add step has no count, or the
    /// plan has nothing to do.
    pub fn validate(&self, chunk_count: usize) -> Result<()> {
        if let Some(index) = self.selected.iter().find(|&&index| index >= chunk_count) {
            return Err(Error::invalid_input().with_message(format!(
                "chunk index {index} is out of range for a document with {chunk_count} chunks"
            )));
        }
        if let Some(pair) = self.selected.windows(2).find(|pair| pair[0] >= pair[1]) {
            return Err(Error::invalid_input().with_message(format!(
                "selected chunk indices must be sorted and unique, found {} before {}",
                pair[0], pair[1]
            )));
        }
        if self.mode.adds() && self.add_count == 0 {
            return Err(Error::invalid_input().with_message("addCount must be at least 1"));
        }
        if self.mode == ProcessingMode::Rewrite && self.selected.is_empty() {
            return Err(Error::invalid_input().with_message("no chunks selected"));
        }
        Ok(())
    }
}

/// Progress of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    /// Steps finished.
    pub completed: usize,
    /// Steps in the run.
    pub total: usize,
    /// Whole-number percentage of finished steps.
    pub percentage: u8,
    /// Chunk index of the last finished step, if it rewrote a chunk.
    pub current_index: Option<usize>,
}

impl Progress {
    /// Creates a progress report.
    pub fn new(completed: usize, total: usize, current_index: Option<usize>) -> Self {
        let percentage = match total {
            0 => 100,
            total => (completed.min(total) * 100 / total) as u8,
        };
        Self {
            completed,
            total,
            percentage,
            current_index,
        }
    }
}

/// Receives updates while a run is in progress.
///
/// Updates are delivered in order and never concurrently for the same run.
#[async_trait::async_trait]
pub trait ProgressSink: Send + Sync {
    /// A step is about to call the provider.
    async fn step_started(&self, _state: JobState) {}

    /// A chunk was rewritten.
    async fn chunk_completed(&self, chunk: &Chunk, progress: Progress);

    /// New chunks were appended.
    async fn chunks_appended(&self, _chunks: &[Chunk], _progress: Progress) {}
}

/// A [`ProgressSink`] that ignores every update.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProgress;

#[async_trait::async_trait]
impl ProgressSink for NoopProgress {
    async fn chunk_completed(&self, _chunk: &Chunk, _progress: Progress) {}
}

/// Result of a run.
///
/// `chunks` always holds the output accumulated so far, including after a
/// failure or cancellation.
#[derive(Debug)]
pub struct ProcessingOutcome {
    /// Document chunks, rewritten where processed, followed by appended chunks.
    pub chunks: Vec<Chunk>,
    /// Number of chunks appended by the add step.
    pub appended: usize,
    /// Final state: completed, cancelled or failed.
    pub state: JobState,
    /// The error that aborted the run.
    pub error: Option<Error>,
}

impl ProcessingOutcome {
    /// Returns the accumulated document.
    pub fn output(&self) -> String {
        join_chunks(self.chunks.iter().map(|chunk| chunk.content.as_str()))
    }

    /// Returns the chunks of a completed run.
    ///
    /// # Errors
    ///
    /// Returns the run's error if it failed, or a cancellation error.
    pub fn into_result(self) -> Result<Vec<Chunk>> {
        match self.state {
            JobState::Completed => Ok(self.chunks),
            JobState::Cancelled => Err(Error::cancelled().with_message("processing was cancelled")),
            _ => Err(self
                .error
                .unwrap_or_else(|| Error::internal_error().with_message("processing did not finish"))),
        }
    }
}

/// Why a run stopped early.
enum Halt {
    Cancelled,
    Failed(Error),
}

/// Processes chunks one at a time with a pause between provider requests.
///
/// A chunk is never dispatched while another chunk of the same run is in
/// flight. Cancellation is checked before each request and during each pause;
/// a request already in flight is awaited and its result discarded.
#[derive(Debug, Clone)]
pub struct SequentialProcessor {
    dispatcher: Dispatcher,
    delay: Duration,
}

impl SequentialProcessor {
    /// Creates a processor pausing `delay` between requests.
    pub fn new(dispatcher: Dispatcher, delay: Duration) -> Self {
        Self { dispatcher, delay }
    }

    /// Creates a processor paced by `config`.
    pub fn from_config(dispatcher: Dispatcher, config: &ProcessorConfig) -> Self {
        Self::new(dispatcher, config.chunk_delay())
    }

    /// Returns the dispatcher.
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Executes `plan` over `chunks`.
    pub async fn run(
        &self,
        chunks: Vec<Chunk>,
        plan: &ProcessingPlan,
        sink: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> ProcessingOutcome {
        let mut run = Run {
            chunks,
            appended: 0,
            completed: 0,
            total: plan.step_count(),
        };

        if let Err(error) = plan.validate(run.chunks.len()) {
            return run.finish(Err(Halt::Failed(error)));
        }

        tracing::info!(
            target: TRACING_TARGET,
            provider = %plan.options.provider,
            mode = ?plan.mode,
            chunks = run.chunks.len(),
            steps = run.total,
            "Processing started"
        );

        let result = self.execute(&mut run, plan, sink, cancel).await;
        run.finish(result)
    }

    async fn execute(
        &self,
        run: &mut Run,
        plan: &ProcessingPlan,
        sink: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<(), Halt> {
        let provider = plan.options.provider;

        if plan.mode.rewrites() {
            let system = plan.options.template().system_prompt();
            self.rewrite_chunks(run, &plan.selected, provider, &system, sink, cancel)
                .await?;
        }

        if plan.mode.adds() {
            if run.completed > 0 {
                self.pause(cancel).await?;
            }
            self.append_chunks(run, plan, sink, cancel).await?;
        }

        Ok(())
    }

    async fn rewrite_chunks(
        &self,
        run: &mut Run,
        indices: &[usize],
        provider: ProviderKind,
        system: &str,
        sink: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<(), Halt> {
        let chunk_count = run.chunks.len();

        for (position, &index) in indices.iter().enumerate() {
            if position > 0 {
                self.pause(cancel).await?;
            }
            if cancel.is_cancelled() {
                return Err(Halt::Cancelled);
            }

            sink.step_started(run.processing_state()).await;

            let source = &run.chunks[index].content;
            let result = self
                .dispatcher
                .dispatch_rendered(provider, system, source, cancel)
                .await;

            if cancel.is_cancelled() {
                tracing::info!(
                    target: TRACING_TARGET,
                    chunk = index,
                    "Discarding result of in-flight chunk after cancellation"
                );
                return Err(Halt::Cancelled);
            }

            let output = result.map_err(|error| {
                let message = format!(
                    "chunk {} of {}: {}",
                    index + 1,
                    chunk_count,
                    error.message_or_kind()
                );
                Halt::Failed(error.with_message(message))
            })?;

            let chunk = &mut run.chunks[index];
            chunk.word_count = count_words(&output);
            chunk.content = output;
            run.completed += 1;

            let progress = Progress::new(run.completed, run.total, Some(index));
            tracing::debug!(
                target: TRACING_TARGET,
                chunk = index,
                completed = progress.completed,
                total = progress.total,
                percentage = progress.percentage,
                "Chunk processed"
            );
            sink.chunk_completed(&run.chunks[index], progress).await;
        }

        Ok(())
    }

    async fn append_chunks(
        &self,
        run: &mut Run,
        plan: &ProcessingPlan,
        sink: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<(), Halt> {
        if cancel.is_cancelled() {
            return Err(Halt::Cancelled);
        }

        sink.step_started(run.processing_state()).await;

        let document = join_chunks(run.chunks.iter().map(|chunk| chunk.content.as_str()));
        let result = self
            .dispatcher
            .extend(
                plan.options.provider,
                &document,
                plan.add_count,
                &plan.options.instructions,
                plan.options.style_source.as_deref(),
            )
            .await;

        if cancel.is_cancelled() {
            tracing::info!(
                target: TRACING_TARGET,
                "Discarding generated chunks after cancellation"
            );
            return Err(Halt::Cancelled);
        }

        let sections = result.map_err(|error| {
            let message = format!("adding new chunks: {}", error.message_or_kind());
            Halt::Failed(error.with_message(message))
        })?;

        let first = run.chunks.len();
        let new_chunks: Vec<Chunk> = sections
            .into_iter()
            .enumerate()
            .map(|(offset, content)| Chunk::detached(first + offset, content))
            .collect();

        run.appended = new_chunks.len();
        run.chunks.extend(new_chunks);
        run.completed += 1;

        let progress = Progress::new(run.completed, run.total, None);
        tracing::debug!(
            target: TRACING_TARGET,
            appended = run.appended,
            "Chunks appended"
        );
        sink.chunks_appended(&run.chunks[first..], progress).await;

        Ok(())
    }

    /// Waits the inter-chunk delay unless cancellation comes first.
    async fn pause(&self, cancel: &CancellationToken) -> Result<(), Halt> {
        if self.delay.is_zero() {
            if cancel.is_cancelled() {
                return Err(Halt::Cancelled);
            }
            return Ok(());
        }

        tracing::trace!(
            target: TRACING_TARGET,
            delay_ms = self.delay.as_millis() as u64,
            "Waiting before next chunk"
        );

        tokio::select! {
            () = cancel.cancelled() => Err(Halt::Cancelled),
            () = tokio::time::sleep(self.delay) => Ok(()),
        }
    }
}

/// Mutable state of one run.
struct Run {
    chunks: Vec<Chunk>,
    appended: usize,
    completed: usize,
    total: usize,
}

impl Run {
    fn processing_state(&self) -> JobState {
        JobState::Processing {
            index: self.completed,
            total: self.total,
        }
    }

    fn finish(mut self, result: Result<(), Halt>) -> ProcessingOutcome {
        align_offsets(&mut self.chunks);

        let (state, error) = match result {
            Ok(()) => {
                tracing::info!(
                    target: TRACING_TARGET,
                    steps = self.completed,
                    appended = self.appended,
                    "Processing completed"
                );
                (JobState::Completed, None)
            }
            Err(Halt::Cancelled) => {
                tracing::info!(
                    target: TRACING_TARGET,
                    completed = self.completed,
                    total = self.total,
                    "Processing cancelled"
                );
                (JobState::Cancelled, None)
            }
            Err(Halt::Failed(error)) => {
                tracing::warn!(
                    target: TRACING_TARGET,
                    error = %error,
                    completed = self.completed,
                    total = self.total,
                    "Processing failed"
                );
                (JobState::Failed, Some(error))
            }
        };

        ProcessingOutcome {
            chunks: self.chunks,
            appended: self.appended,
            state,
            error,
        }
    }
}
