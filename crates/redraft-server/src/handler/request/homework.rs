//! Homework request types.

use redraft_core::ProviderKind;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::not_blank;

/// Request payload for solving an assignment.
#[must_use]
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SolveHomework {
    /// Assignment to solve or answer.
    #[validate(custom(function = "not_blank"))]
    pub assignment_text: String,
    /// Provider that solves the assignment.
    pub llm_provider: ProviderKind,
    /// Extra guidance, such as the expected format.
    #[serde(default)]
    pub special_instructions: Option<String>,
}
