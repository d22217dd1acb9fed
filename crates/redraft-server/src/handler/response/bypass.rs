//! GPT-Bypass response types.

use jiff::Timestamp;
use redraft_core::ProviderKind;
use redraft_core::chunk::{Chunk, PREVIEW_CHARS};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::service::{self, RewriteStatus};

/// Result of a humanizing rewrite.
#[must_use]
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BypassResult {
    /// Identifier of the stored rewrite job.
    pub job_id: Uuid,
    /// The humanized text.
    pub output_text: String,
    /// Status of the job.
    pub status: RewriteStatus,
}

/// A stored rewrite job.
#[must_use]
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RewriteJob {
    /// Identifier of the job.
    pub id: Uuid,
    /// Submitted text.
    pub input_text: String,
    /// Submitted style sample.
    pub style_text: Option<String>,
    /// Provider that performed the rewrite.
    pub provider: ProviderKind,
    /// The humanized text, once completed.
    pub output_text: Option<String>,
    /// Status of the job.
    pub status: RewriteStatus,
    /// Failure reason, if the rewrite failed.
    pub error_message: Option<String>,
    /// Timestamp when the job was created.
    pub created_at: Timestamp,
    /// Timestamp when the job was last updated.
    pub updated_at: Timestamp,
}

impl From<service::RewriteJob> for RewriteJob {
    fn from(job: service::RewriteJob) -> Self {
        Self {
            id: job.id,
            input_text: job.input_text,
            style_text: job.style_text,
            provider: job.provider,
            output_text: job.output_text,
            status: job.status,
            error_message: job.error_message,
            created_at: job.created_at,
            updated_at: job.updated_at,
        }
    }
}

/// Response for listing rewrite jobs, newest first.
pub type RewriteJobs = Vec<RewriteJob>;

/// Preview of one chunk.
#[must_use]
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChunkPreview {
    /// Zero-based position of the chunk.
    pub index: usize,
    /// Full chunk text.
    pub content: String,
    /// Number of words in the chunk.
    pub word_count: usize,
    /// Leading characters of the chunk, cut at a word boundary.
    pub preview: String,
}

impl From<Chunk> for ChunkPreview {
    fn from(chunk: Chunk) -> Self {
        Self {
            preview: chunk.preview(PREVIEW_CHARS),
            index: chunk.index,
            word_count: chunk.word_count,
            content: chunk.content,
        }
    }
}

/// Chunks of a text.
#[must_use]
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChunkPreviews {
    /// Chunks in document order.
    pub chunks: Vec<ChunkPreview>,
}

impl FromIterator<Chunk> for ChunkPreviews {
    fn from_iter<I: IntoIterator<Item = Chunk>>(iter: I) -> Self {
        Self {
            chunks: iter.into_iter().map(ChunkPreview::from).collect(),
        }
    }
}
