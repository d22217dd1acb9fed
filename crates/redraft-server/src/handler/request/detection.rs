//! AI detection request types.

use redraft_core::ProviderKind;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::not_blank;

/// Request payload for scoring a text, falling back to a language model.
#[must_use]
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DetectAi {
    /// Text to score.
    #[validate(custom(function = "not_blank"))]
    pub text: String,
    /// Provider used when the detection service is unavailable.
    pub llm_provider: ProviderKind,
}

/// Request payload for scoring a text with the detection service only.
#[must_use]
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CheckAi {
    /// Text to score.
    #[validate(custom(function = "not_blank"))]
    pub text: String,
}
