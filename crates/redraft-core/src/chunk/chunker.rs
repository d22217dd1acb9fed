use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;
use unicode_segmentation::UnicodeSegmentation;

use super::{Chunk, ChunkerConfig, TRACING_TARGET, count_words};

static PARAGRAPH_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n[ \t]*\r?\n\s*").expect("invalid paragraph regex"));

/// A unit of text with its byte range in the source and its word count.
#[derive(Debug, Clone)]
struct Span {
    range: Range<usize>,
    words: usize,
}

/// Splits documents into word-bounded [`Chunk`]s.
///
/// Splits prefer blank-line paragraph boundaries. A paragraph larger than the
/// target on its own is split on Unicode sentence boundaries; a single
/// sentence larger than the target becomes its own oversized chunk.
#[derive(Debug, Clone, Copy, Default)]
pub struct Chunker {
    config: ChunkerConfig,
}

impl Chunker {
    /// Creates a chunker with the given configuration.
    pub const fn new(config: ChunkerConfig) -> Self {
        Self { config }
    }

    /// Returns the configuration.
    pub const fn config(&self) -> &ChunkerConfig {
        &self.config
    }

    /// Splits `text` into ordered chunks.
    ///
    /// Empty or whitespace-only input yields no chunks. Input that fits the
    /// target yields one chunk equal to the trimmed input.
    pub fn chunk(&self, text: &str) -> Vec<Chunk> {
        let total_words = count_words(text);
        let Some(whole) = trimmed(text, 0..text.len()) else {
            return Vec::new();
        };

        let target = self.config.target_words(total_words);
        if total_words <= target {
            return vec![Chunk::from_span(0, text, whole.start, whole.end)];
        }

        let mut packer = Packer::new(text, target);
        for paragraph in paragraphs(text) {
            if paragraph.words > target {
                packer.flush();
                for sentence in sentences(text, &paragraph.range) {
                    packer.push(sentence);
                }
                packer.flush();
            } else {
                packer.push(paragraph);
            }
        }

        let chunks = packer.finish();
        tracing::debug!(
            target: TRACING_TARGET,
            total_words,
            target_words = target,
            chunks = chunks.len(),
            "Chunked document"
        );

        chunks
    }
}

/// Greedily packs consecutive spans into chunks of at most `target` words.
struct Packer<'a> {
    source: &'a str,
    target: usize,
    current: Option<Range<usize>>,
    current_words: usize,
    chunks: Vec<Chunk>,
}

impl<'a> Packer<'a> {
    fn new(source: &'a str, target: usize) -> Self {
        Self {
            source,
            target,
            current: None,
            current_words: 0,
            chunks: Vec::new(),
        }
    }

    fn push(&mut self, span: Span) {
        if self.current_words > 0 && self.current_words + span.words > self.target {
            self.flush();
        }

        self.current = Some(match self.current.take() {
            Some(current) => current.start..span.range.end,
            None => span.range,
        });
        self.current_words += span.words;
    }

    fn flush(&mut self) {
        if let Some(range) = self.current.take() {
            let index = self.chunks.len();
            self.chunks
                .push(Chunk::from_span(index, self.source, range.start, range.end));
        }
        self.current_words = 0;
    }

    fn finish(mut self) -> Vec<Chunk> {
        self.flush();
        self.chunks
    }
}

/// Returns the trimmed, non-empty paragraphs of `text`.
fn paragraphs(text: &str) -> impl Iterator<Item = Span> + '_ {
    let mut start = 0;
    let mut ranges = Vec::new();
    for separator in PARAGRAPH_BREAK.find_iter(text) {
        ranges.push(start..separator.start());
        start = separator.end();
    }
    ranges.push(start..text.len());

    ranges
        .into_iter()
        .filter_map(move |range| trimmed(text, range))
        .map(move |range| Span {
            words: count_words(&text[range.clone()]),
            range,
        })
}

/// Returns the trimmed, non-empty sentences inside `paragraph`.
fn sentences<'a>(text: &'a str, paragraph: &Range<usize>) -> impl Iterator<Item = Span> + 'a {
    let offset = paragraph.start;
    text[paragraph.clone()]
        .split_sentence_bound_indices()
        .filter_map(move |(start, sentence)| {
            let start = offset + start;
            trimmed(text, start..start + sentence.len())
        })
        .map(move |range| Span {
            words: count_words(&text[range.clone()]),
            range,
        })
}

/// Narrows `range` to exclude surrounding whitespace, or returns `None` if
/// nothing remains.
fn trimmed(text: &str, range: Range<usize>) -> Option<Range<usize>> {
    let slice = &text[range.clone()];
    let leading = slice.len() - slice.trim_start().len();
    let trailing = slice.len() - slice.trim_end().len();
    let start = range.start + leading;
    let end = range.end - trailing;
    (start < end).then_some(start..end)
}
