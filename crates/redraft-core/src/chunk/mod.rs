//! Word-bounded document chunking.
//!
//! A [`Chunker`] splits a document into ordered [`Chunk`]s along paragraph
//! boundaries, falling back to sentence boundaries for paragraphs that are
//! too large on their own. Every chunk is an exact slice of the source, so
//! chunks can be mapped back onto the original document.

mod chunker;
mod config;
pub mod selection;

use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

pub use chunker::Chunker;
pub use config::ChunkerConfig;
pub use selection::{Selection, SelectionPattern};

/// Tracing target for chunking operations.
pub const TRACING_TARGET: &str = "redraft_core::chunk";

/// Separator placed between chunks when a document is reassembled.
pub const CHUNK_SEPARATOR: &str = "\n\n";

/// Default preview length in characters.
pub const PREVIEW_CHARS: usize = 200;

/// A contiguous slice of a source document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
#[serde(rename_all = "camelCase")]
pub struct Chunk {
    /// Position of the chunk in the document.
    pub index: usize,
    /// Chunk text, equal to `source[start..end]`.
    ///
    /// After processing, the source is the reassembled document returned by
    /// [`join_chunks`].
    pub content: String,
    /// Byte offset of the first character in the source.
    pub start: usize,
    /// Byte offset one past the last character in the source.
    pub end: usize,
    /// Number of words in the chunk.
    pub word_count: usize,
}

impl Chunk {
    /// Creates a chunk from a byte range of `source`.
    pub(crate) fn from_span(index: usize, source: &str, start: usize, end: usize) -> Self {
        let content = &source[start..end];
        Self {
            index,
            content: content.to_owned(),
            start,
            end,
            word_count: count_words(content),
        }
    }

    /// Creates a chunk that is not backed by a source document, such as one
    /// generated by a provider.
    pub fn detached(index: usize, content: impl Into<String>) -> Self {
        let content = content.into();
        Self {
            index,
            start: 0,
            end: content.len(),
            word_count: count_words(&content),
            content,
        }
    }

    /// Returns at most `max_chars` characters of the content, cut at a word
    /// boundary, with an ellipsis when truncated.
    pub fn preview(&self, max_chars: usize) -> String {
        preview(&self.content, max_chars)
    }
}

/// Counts the words of `text` using Unicode word boundaries.
pub fn count_words(text: &str) -> usize {
    text.unicode_words().count()
}

/// Joins chunk contents with [`CHUNK_SEPARATOR`].
pub fn join_chunks<I, S>(chunks: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut joined = String::new();
    for (position, chunk) in chunks.into_iter().enumerate() {
        if position > 0 {
            joined.push_str(CHUNK_SEPARATOR);
        }
        joined.push_str(chunk.as_ref());
    }
    joined
}

/// Points `start` and `end` of every chunk at its place in
/// [`join_chunks`] of the same chunks.
pub fn align_offsets(chunks: &mut [Chunk]) {
    let mut offset = 0;
    for chunk in chunks {
        chunk.start = offset;
        chunk.end = offset + chunk.content.len();
        offset = chunk.end + CHUNK_SEPARATOR.len();
    }
}

/// Returns at most `max_chars` characters of `text`, cut at a word boundary.
pub fn preview(text: &str, max_chars: usize) -> String {
    let text = text.trim();
    let Some((cut, _)) = text.char_indices().nth(max_chars) else {
        return text.to_owned();
    };

    let head = &text[..cut];
    let head = match head.rfind(char::is_whitespace) {
        Some(space) if space > 0 => &head[..space],
        _ => head,
    };

    format!("{}...", head.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_cuts_at_word_boundary() {
        let chunk = Chunk::detached(0, "The quick brown fox jumps over the lazy dog");
        assert_eq!(chunk.preview(12), "The quick...");
        assert_eq!(chunk.preview(100), "The quick brown fox jumps over the lazy dog");
    }

    #[test]
    fn preview_handles_multibyte_text() {
        assert_eq!(preview("ééé ééé ééé", 5), "ééé...");
    }

    #[test]
    fn join_uses_blank_lines() {
        assert_eq!(join_chunks(["one", "two", "three"]), "one\n\ntwo\n\nthree");
        assert_eq!(join_chunks(Vec::<String>::new()), "");
    }

    #[test]
    fn words_follow_unicode_boundaries() {
        assert_eq!(count_words("Hello, world! It's 3.5 km."), 5);
        assert_eq!(count_words("   "), 0);
    }
}
