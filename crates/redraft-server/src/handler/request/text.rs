//! Text rewriting request types.

use redraft_core::ProviderKind;
use redraft_core::pipeline::RewriteOptions;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use super::{not_blank, validation_error};

/// Request payload for rewriting a text in one call.
#[must_use]
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProcessText {
    /// Text to rewrite.
    #[validate(custom(function = "not_blank"))]
    pub input_text: String,
    /// Instructions describing the rewrite.
    #[serde(default)]
    pub instructions: String,
    /// Reference material the model may draw facts from.
    #[serde(default)]
    pub content_source: Option<String>,
    /// Reference text whose style should be imitated.
    #[serde(default)]
    pub style_source: Option<String>,
    /// Provider that performs the rewrite.
    pub llm_provider: ProviderKind,
    /// Whether `contentSource` is passed to the provider.
    #[serde(default)]
    pub use_content_source: bool,
    /// Whether `styleSource` is passed to the provider. Defaults to true when
    /// a style source is present.
    #[serde(default)]
    pub use_style_source: Option<bool>,
    /// Phrase the result as a concise exam answer.
    #[serde(default)]
    pub exam_mode: bool,
}

impl ProcessText {
    /// Splits the request into rewrite options and the text to rewrite.
    pub fn into_parts(self) -> (RewriteOptions, String) {
        let content_source = self.content_source.filter(|_| self.use_content_source);
        let use_style_source = self
            .use_style_source
            .unwrap_or_else(|| self.style_source.is_some());
        let style_source = self.style_source.filter(|_| use_style_source);

        let options = RewriteOptions::new(self.llm_provider, self.instructions)
            .with_content_source(content_source)
            .with_style_source(style_source)
            .with_exam_mode(self.exam_mode);

        (options, self.input_text)
    }
}

/// Request payload for rewriting one chunk of a larger document.
///
/// The client owns chunking and sequencing; the position is echoed back so
/// it can reassemble the document.
#[must_use]
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_chunk_position"))]
pub struct ProcessChunk {
    /// Text and options of the rewrite.
    #[serde(flatten)]
    #[validate(nested)]
    pub text: ProcessText,
    /// Zero-based position of this chunk.
    pub chunk_index: usize,
    /// Number of chunks in the document.
    #[validate(range(min = 1))]
    pub total_chunks: usize,
}

fn validate_chunk_position(request: &ProcessChunk) -> Result<(), ValidationError> {
    if request.chunk_index >= request.total_chunks {
        return Err(validation_error(
            "chunk_position",
            "chunkIndex must be less than totalChunks",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> ProcessText {
        ProcessText {
            input_text: "Some text".to_owned(),
            instructions: "Make it formal".to_owned(),
            content_source: Some("facts".to_owned()),
            style_source: Some("style".to_owned()),
            llm_provider: ProviderKind::OpenAi,
            use_content_source: false,
            use_style_source: None,
            exam_mode: false,
        }
    }

    #[test]
    fn sources_follow_usage_flags() {
        let (options, text) = request().into_parts();
        assert_eq!(text, "Some text");
        assert_eq!(options.content_source, None);
        assert_eq!(options.style_source.as_deref(), Some("style"));

        let mut disabled = request();
        disabled.use_content_source = true;
        disabled.use_style_source = Some(false);
        let (options, _) = disabled.into_parts();
        assert_eq!(options.content_source.as_deref(), Some("facts"));
        assert_eq!(options.style_source, None);
    }

    #[test]
    fn chunk_index_must_be_in_range() {
        let chunk = ProcessChunk {
            text: request(),
            chunk_index: 3,
            total_chunks: 3,
        };
        assert!(chunk.validate().is_err());

        let chunk = ProcessChunk {
            chunk_index: 2,
            ..chunk
        };
        assert!(chunk.validate().is_ok());
    }

    #[test]
    fn blank_input_is_rejected() {
        let mut blank = request();
        blank.input_text = "   ".to_owned();
        assert!(blank.validate().is_err());
    }
}
