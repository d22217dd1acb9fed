//! Document processing request types.

use redraft_core::ProviderKind;
use redraft_core::chunk::Selection;
use redraft_core::pipeline::{ProcessingMode, RewriteOptions};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::not_blank;

/// Request payload for submitting a document.
#[must_use]
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateDocument {
    /// Full document text.
    #[validate(custom(function = "not_blank"))]
    pub text: String,
    /// Fixed chunk size in words; the adaptive target is used when absent.
    #[serde(default)]
    #[validate(range(min = 10, max = 20000))]
    pub max_words: Option<usize>,
}

/// Request payload for resolving a selection without starting the job.
#[must_use]
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResolveSelection {
    /// Chunks to select.
    #[serde(default)]
    pub selection: Selection,
}

/// Request payload for starting sequential processing.
#[must_use]
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct StartProcessing {
    /// Rewrite, add or both.
    #[serde(default)]
    pub mode: ProcessingMode,
    /// Chunks to rewrite. Ignored in `add` mode.
    #[serde(default)]
    pub selection: Selection,
    /// Number of chunks to append in `add` and `both` modes.
    #[serde(default)]
    #[validate(range(min = 1, max = 50))]
    pub add_count: Option<usize>,
    /// Instructions describing the rewrite.
    #[serde(default)]
    pub instructions: String,
    /// Provider that processes the chunks.
    pub llm_provider: ProviderKind,
    /// Reference material the model may draw facts from.
    #[serde(default)]
    pub content_source: Option<String>,
    /// Reference text whose style should be imitated.
    #[serde(default)]
    pub style_source: Option<String>,
    /// Phrase rewritten chunks as concise exam answers.
    #[serde(default)]
    pub exam_mode: bool,
}

impl StartProcessing {
    /// Returns the rewrite options of the run.
    pub fn options(&self) -> RewriteOptions {
        RewriteOptions::new(self.llm_provider, self.instructions.clone())
            .with_content_source(self.content_source.clone())
            .with_style_source(self.style_source.clone())
            .with_exam_mode(self.exam_mode)
    }

    /// Returns the number of chunks to append, defaulting to one.
    pub fn add_count(&self) -> usize {
        if self.mode.adds() {
            self.add_count.unwrap_or(1)
        } else {
            0
        }
    }
}
