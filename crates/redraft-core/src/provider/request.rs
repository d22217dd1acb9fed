//! Completion request types shared by all provider adapters.

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::text::estimate_tokens;

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// Message written by the end user.
    User,
    /// Message produced by the model.
    Assistant,
}

impl ChatRole {
    /// Returns the role name used by vendor APIs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// A single conversational turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
pub struct ChatMessage {
    /// Author of the message.
    pub role: ChatRole,
    /// Message text.
    pub content: String,
}

impl ChatMessage {
    /// Creates a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    /// Creates an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// A provider-agnostic completion request.
///
/// The system prompt is kept apart from the turns because Anthropic takes it
/// as a top-level field while OpenAI-compatible APIs expect a `system` message.
#[derive(Debug, Clone, Builder)]
#[builder(pattern = "owned", setter(into, strip_option, prefix = "with"))]
pub struct CompletionRequest {
    /// System prompt.
    #[builder(default)]
    pub system: Option<String>,
    /// Conversation turns, oldest first. The last turn is the user input.
    pub messages: Vec<ChatMessage>,
    /// Upper bound on generated tokens.
    #[builder(default)]
    pub max_tokens: Option<u32>,
    /// Sampling temperature.
    #[builder(default)]
    pub temperature: Option<f32>,
}

impl CompletionRequest {
    /// Creates a new request builder.
    pub fn builder() -> CompletionRequestBuilder {
        CompletionRequestBuilder::default()
    }

    /// Creates a request with a system prompt and a single user turn.
    pub fn single(system: impl Into<String>, input: impl Into<String>) -> Self {
        Self {
            system: Some(system.into()),
            messages: vec![ChatMessage::user(input)],
            max_tokens: None,
            temperature: None,
        }
    }

    /// Sets the upper bound on generated tokens.
    #[must_use]
    pub fn with_max_output_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Estimated prompt size in tokens across the system prompt and all turns.
    pub fn estimated_tokens(&self) -> usize {
        let system = self.system.as_deref().map_or(0, estimate_tokens);
        let turns: usize = self
            .messages
            .iter()
            .map(|message| estimate_tokens(&message.content))
            .sum();
        system + turns
    }

    /// Returns the content of the last user turn.
    pub fn last_user_content(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|message| message.role == ChatRole::User)
            .map(|message| message.content.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_optional_fields() -> anyhow::Result<()> {
        let request = CompletionRequest::builder()
            .with_system("be brief")
            .with_messages(vec![ChatMessage::user("hello")])
            .with_max_tokens(64u32)
            .build()?;

        assert_eq!(request.system.as_deref(), Some("be brief"));
        assert_eq!(request.max_tokens, Some(64));
        assert!(request.temperature.is_none());
        Ok(())
    }

    #[test]
    fn estimate_counts_system_and_turns() {
        let request = CompletionRequest::single("abcd", "abcdefgh");
        assert_eq!(request.estimated_tokens(), 3);
    }

    #[test]
    fn last_user_content_skips_assistant_turns() {
        let request = CompletionRequest {
            system: None,
            messages: vec![
                ChatMessage::user("first"),
                ChatMessage::assistant("reply"),
                ChatMessage::user("second"),
                ChatMessage::assistant("trailing"),
            ],
            max_tokens: None,
            temperature: None,
        };
        assert_eq!(request.last_user_content(), Some("second"));
    }
}
