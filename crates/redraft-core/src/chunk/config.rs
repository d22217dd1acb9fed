//! Chunker configuration.

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};

/// Default values for configuration options.
mod defaults {
    /// Target chunk size for documents up to 20 000 words.
    pub const BASELINE_WORDS: usize = 1_000;

    /// Upper bound on the adaptive target.
    pub const MAX_WORDS: usize = 4_000;

    pub fn baseline_words() -> usize {
        BASELINE_WORDS
    }

    pub fn max_words() -> usize {
        MAX_WORDS
    }

    pub fn scaling() -> bool {
        true
    }
}

/// Word thresholds used by the [`Chunker`].
///
/// With scaling enabled the target grows with the document:
///
/// | Document size   | Target               |
/// |-----------------|----------------------|
/// | ≤ 20 000 words  | `baseline_words`     |
/// | ≤ 50 000 words  | 2 × `baseline_words` |
/// | ≤ 100 000 words | 3 × `baseline_words` |
/// | > 100 000 words | 4 × `baseline_words` |
///
/// and is capped at `max_words`.
///
/// [`Chunker`]: super::Chunker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct ChunkerConfig {
    /// Target chunk size in words for small documents.
    #[cfg_attr(
        feature = "config",
        arg(long = "chunk-baseline-words", env = "CHUNK_BASELINE_WORDS", default_value = "1000")
    )]
    #[serde(default = "defaults::baseline_words")]
    pub baseline_words: usize,

    /// Largest adaptive target in words.
    #[cfg_attr(
        feature = "config",
        arg(long = "chunk-max-words", env = "CHUNK_MAX_WORDS", default_value = "4000")
    )]
    #[serde(default = "defaults::max_words")]
    pub max_words: usize,

    /// Grow the target with the document length.
    #[cfg_attr(
        feature = "config",
        arg(
            long = "chunk-scaling",
            env = "CHUNK_SCALING",
            default_value = "true",
            action = clap::ArgAction::Set
        )
    )]
    #[serde(default = "defaults::scaling")]
    pub scaling: bool,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            baseline_words: defaults::BASELINE_WORDS,
            max_words: defaults::MAX_WORDS,
            scaling: true,
        }
    }
}

impl ChunkerConfig {
    /// Creates a fixed-size configuration without scaling.
    pub const fn fixed(words: usize) -> Self {
        Self {
            baseline_words: words,
            max_words: words,
            scaling: false,
        }
    }

    /// Sets the baseline target.
    #[must_use]
    pub const fn with_baseline_words(mut self, words: usize) -> Self {
        self.baseline_words = words;
        self
    }

    /// Sets the upper bound on the adaptive target.
    #[must_use]
    pub const fn with_max_words(mut self, words: usize) -> Self {
        self.max_words = words;
        self
    }

    /// Returns the target chunk size for a document of `total_words`.
    pub fn target_words(&self, total_words: usize) -> usize {
        let baseline = self.baseline_words.max(1);
        if !self.scaling {
            return baseline;
        }

        let factor = match total_words {
            ..=20_000 => 1,
            ..=50_000 => 2,
            ..=100_000 => 3,
            _ => 4,
        };

        (baseline * factor).min(self.max_words.max(baseline))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_target_scales_with_document() {
        let config = ChunkerConfig::default();
        assert_eq!(config.target_words(500), 1_000);
        assert_eq!(config.target_words(20_000), 1_000);
        assert_eq!(config.target_words(20_001), 2_000);
        assert_eq!(config.target_words(50_000), 2_000);
        assert_eq!(config.target_words(100_000), 3_000);
        assert_eq!(config.target_words(250_000), 4_000);
    }

    #[test]
    fn max_words_caps_the_target() {
        let config = ChunkerConfig::default().with_max_words(2_500);
        assert_eq!(config.target_words(80_000), 2_500);
    }

    #[test]
    fn fixed_config_ignores_length() {
        let config = ChunkerConfig::fixed(600);
        assert_eq!(config.target_words(1_000_000), 600);
    }

    #[test]
    fn missing_fields_use_defaults() -> anyhow::Result<()> {
        let config: ChunkerConfig = serde_json::from_str(r#"{"max_words": 3000}"#)?;
        assert_eq!(config.baseline_words, 1_000);
        assert_eq!(config.max_words, 3_000);
        assert!(config.scaling);
        Ok(())
    }
}
