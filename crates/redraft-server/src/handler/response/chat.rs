use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Reply of the assistant.
#[must_use]
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
    /// Assistant message, as generated.
    pub response: String,
}
