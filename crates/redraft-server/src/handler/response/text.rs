//! Text response types.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Generated text: a rewrite, a solved assignment or a transcript.
#[must_use]
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedText {
    /// The generated text. Empty while a background job produces it.
    pub result: String,
    /// Document job producing the text, when it was too long for one request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<Uuid>,
}

impl ProcessedText {
    /// Wraps a generated text.
    pub fn new(result: impl Into<String>) -> Self {
        Self {
            result: result.into(),
            job_id: None,
        }
    }

    /// Points at the document job that produces the text.
    pub fn deferred(job_id: Uuid) -> Self {
        Self {
            result: String::new(),
            job_id: Some(job_id),
        }
    }
}

/// A rewritten chunk with its position in the document.
#[must_use]
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedChunk {
    /// The rewritten chunk.
    pub result: String,
    /// Zero-based position of the chunk.
    pub chunk_index: usize,
    /// Number of chunks in the document.
    pub total_chunks: usize,
}
