//! GPT-Bypass request types.

use redraft_core::ProviderKind;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::not_blank;

/// Request payload for humanizing a text.
#[must_use]
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BypassRewrite {
    /// Text to humanize.
    #[validate(custom(function = "not_blank"))]
    pub input_text: String,
    /// Writing sample whose style should be imitated.
    #[serde(default)]
    pub style_text: Option<String>,
    /// Provider that performs the rewrite.
    pub provider: ProviderKind,
    /// Extra instructions appended to the prompt.
    #[serde(default)]
    pub custom_instructions: Option<String>,
}

/// Request payload for previewing how a text is chunked.
#[must_use]
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChunkText {
    /// Text to split.
    pub text: String,
    /// Fixed chunk size in words; the adaptive target is used when absent.
    #[serde(default)]
    #[validate(range(min = 10, max = 20000))]
    pub max_words: Option<usize>,
}

/// Query parameters for listing rewrite jobs.
#[must_use]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ListRewriteJobs {
    /// Maximum number of jobs to return, newest first.
    #[serde(default = "default_limit")]
    #[validate(range(min = 1, max = 100))]
    pub limit: usize,
}

impl Default for ListRewriteJobs {
    fn default() -> Self {
        Self {
            limit: default_limit(),
        }
    }
}

fn default_limit() -> usize {
    20
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_defaults_and_bounds() -> anyhow::Result<()> {
        let query: ListRewriteJobs = serde_json::from_str("{}")?;
        assert_eq!(query.limit, 20);
        assert!(query.validate().is_ok());

        let query = ListRewriteJobs { limit: 101 };
        assert!(query.validate().is_err());
        Ok(())
    }
}
