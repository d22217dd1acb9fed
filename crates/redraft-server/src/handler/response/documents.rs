//! Document processing response types.

use jiff::Timestamp;
use redraft_core::ProviderKind;
use redraft_core::chunk::PREVIEW_CHARS;
use redraft_core::pipeline::{JobState, ProcessingMode, Progress};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::service::{ChunkStatus, ProcessingJob};

/// One chunk of a processing job.
#[must_use]
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DocumentChunk {
    /// Zero-based position of the chunk.
    pub index: usize,
    /// Number of words in the current content.
    pub word_count: usize,
    /// Leading characters of the current content.
    pub preview: String,
    /// Current content: original, rewritten or appended.
    pub content: String,
    /// Where the current content came from.
    pub status: ChunkStatus,
}

/// A document processing job.
#[must_use]
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DocumentJob {
    /// Identifier of the job.
    pub job_id: Uuid,
    /// Lifecycle state.
    pub status: JobState,
    /// Mode of the run, once started.
    pub mode: Option<ProcessingMode>,
    /// Provider of the run, once started.
    pub provider: Option<ProviderKind>,
    /// Chunk indices selected for rewriting, once started.
    pub selected: Vec<usize>,
    /// Progress of the run.
    pub progress: Progress,
    /// Chunks in document order, followed by appended chunks.
    pub chunks: Vec<DocumentChunk>,
    /// The document as accumulated so far.
    pub output: String,
    /// Why the run failed.
    pub error: Option<String>,
    /// Timestamp when the job was created.
    pub created_at: Timestamp,
    /// Timestamp when the job was last updated.
    pub updated_at: Timestamp,
}

impl From<ProcessingJob> for DocumentJob {
    fn from(job: ProcessingJob) -> Self {
        let output = job.output();
        let (mode, provider, selected) = match job.run {
            Some(run) => (Some(run.mode), Some(run.provider), run.selected),
            None => (None, None, Vec::new()),
        };

        let chunks = job
            .chunks
            .into_iter()
            .zip(job.statuses)
            .map(|(chunk, status)| DocumentChunk {
                preview: chunk.preview(PREVIEW_CHARS),
                index: chunk.index,
                word_count: chunk.word_count,
                content: chunk.content,
                status,
            })
            .collect();

        Self {
            job_id: job.id,
            status: job.state,
            mode,
            provider,
            selected,
            progress: job.progress,
            chunks,
            output,
            error: job.error,
            created_at: job.created_at,
            updated_at: job.updated_at,
        }
    }
}

/// Chunk indices a selection resolves to.
#[must_use]
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedSelection {
    /// Sorted, deduplicated chunk indices.
    pub indices: Vec<usize>,
}
