//! Chat request types.

use redraft_core::ProviderKind;
use redraft_core::provider::ChatMessage;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::not_blank;

/// Request payload for sending a chat message.
#[must_use]
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SendChatMessage {
    /// The new user message.
    #[validate(custom(function = "not_blank"))]
    pub message: String,
    /// Earlier turns of the conversation, oldest first.
    #[serde(default)]
    #[validate(length(max = 200))]
    pub conversation_history: Vec<ChatMessage>,
    /// Provider that answers.
    pub llm_provider: ProviderKind,
    /// Document the conversation is about.
    #[serde(default)]
    pub context_document: Option<String>,
}
