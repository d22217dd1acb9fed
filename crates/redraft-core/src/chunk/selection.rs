//! Chunk selection.
//!
//! Clients choose which chunks to process either explicitly or through a
//! [`SelectionPattern`]. Every selection resolves to sorted, deduplicated
//! indices; indices outside the document are rejected, and counts larger than
//! the document saturate.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Which chunks of a document to process.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Selection {
    /// Every chunk.
    #[default]
    All,
    /// Explicit chunk indices.
    Indices {
        /// Zero-based chunk indices, in any order.
        indices: Vec<usize>,
    },
    /// An inclusive index range.
    Range {
        /// First selected index.
        start: usize,
        /// Last selected index.
        end: usize,
    },
    /// A pattern evaluated against the chunk count.
    Pattern {
        /// The pattern to evaluate.
        pattern: SelectionPattern,
    },
}

/// Selection patterns resolved against the number of chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SelectionPattern {
    /// The first `count` chunks.
    First {
        /// Number of chunks.
        count: usize,
    },
    /// The last `count` chunks.
    Last {
        /// Number of chunks.
        count: usize,
    },
    /// Every `step`-th chunk starting at `offset`.
    EveryNth {
        /// Distance between selected chunks.
        step: usize,
        /// Index of the first selected chunk.
        #[serde(default)]
        offset: usize,
    },
    /// The first `count` and the last `count` chunks.
    Bookends {
        /// Number of chunks taken from each end.
        count: usize,
    },
    /// `count` chunks spread evenly, including the first and last chunk.
    Evenly {
        /// Number of chunks.
        count: usize,
    },
}

impl Selection {
    /// Resolves the selection against a document of `total` chunks.
    ///
    /// # Errors
    ///
    /// Returns an invalid input error if an explicit index or range falls
    /// outside the document, a range is reversed, or a pattern is degenerate.
    pub fn resolve(&self, total: usize) -> Result<Vec<usize>> {
        let indices: BTreeSet<usize> = match self {
            Self::All => (0..total).collect(),
            Self::Indices { indices } => {
                if let Some(index) = indices.iter().find(|&&index| index >= total) {
                    return Err(out_of_range(*index, total));
                }
                indices.iter().copied().collect()
            }
            Self::Range { start, end } => {
                if start > end {
                    return Err(Error::invalid_input().with_message(format!(
                        "selection range start {start} is after end {end}"
                    )));
                }
                if *end >= total {
                    return Err(out_of_range(*end, total));
                }
                (*start..=*end).collect()
            }
            Self::Pattern { pattern } => pattern.resolve(total)?,
        };

        Ok(indices.into_iter().collect())
    }
}

impl SelectionPattern {
    fn resolve(self, total: usize) -> Result<BTreeSet<usize>> {
        let indices = match self {
            Self::First { count } => (0..count.min(total)).collect(),
            Self::Last { count } => (total.saturating_sub(count)..total).collect(),
            Self::EveryNth { step, offset } => {
                if step == 0 {
                    return Err(
                        Error::invalid_input().with_message("everyNth step must be at least 1")
                    );
                }
                (offset..total).step_by(step).collect()
            }
            Self::Bookends { count } => {
                let count = count.min(total);
                (0..count).chain(total - count..total).collect()
            }
            Self::Evenly { count } => evenly(count.min(total), total),
        };

        Ok(indices)
    }
}

fn evenly(count: usize, total: usize) -> BTreeSet<usize> {
    match count {
        0 => BTreeSet::new(),
        1 => BTreeSet::from([0]),
        _ => (0..count)
            .map(|i| (i * (total - 1) + (count - 1) / 2) / (count - 1))
            .collect(),
    }
}

fn out_of_range(index: usize, total: usize) -> Error {
    Error::invalid_input().with_message(format!(
        "chunk index {index} is out of range for a document with {total} chunks"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    fn pattern(pattern: SelectionPattern) -> Selection {
        Selection::Pattern { pattern }
    }

    #[test]
    fn explicit_indices_are_sorted_and_deduplicated() -> anyhow::Result<()> {
        let selection = Selection::Indices {
            indices: vec![4, 1, 4, 0],
        };
        assert_eq!(selection.resolve(5)?, vec![0, 1, 4]);
        Ok(())
    }

    #[test]
    fn out_of_range_index_is_rejected() {
        let selection = Selection::Indices { indices: vec![5] };
        let error = selection.resolve(5).unwrap_err();
        assert_eq!(error.kind, ErrorKind::InvalidInput);

        let range = Selection::Range { start: 2, end: 9 };
        assert!(range.resolve(5).is_err());

        let reversed = Selection::Range { start: 3, end: 1 };
        assert!(reversed.resolve(5).is_err());
    }

    #[test]
    fn range_is_inclusive() -> anyhow::Result<()> {
        let selection = Selection::Range { start: 1, end: 3 };
        assert_eq!(selection.resolve(5)?, vec![1, 2, 3]);
        Ok(())
    }

    #[test]
    fn counts_saturate() -> anyhow::Result<()> {
        assert_eq!(pattern(SelectionPattern::First { count: 10 }).resolve(3)?, vec![0, 1, 2]);
        assert_eq!(pattern(SelectionPattern::Last { count: 2 }).resolve(5)?, vec![3, 4]);
        assert_eq!(
            pattern(SelectionPattern::Bookends { count: 9 }).resolve(4)?,
            vec![0, 1, 2, 3]
        );
        Ok(())
    }

    #[test]
    fn every_nth_honors_offset() -> anyhow::Result<()> {
        let every = pattern(SelectionPattern::EveryNth { step: 3, offset: 1 });
        assert_eq!(every.resolve(10)?, vec![1, 4, 7]);

        let zero = pattern(SelectionPattern::EveryNth { step: 0, offset: 0 });
        assert!(zero.resolve(10).is_err());
        Ok(())
    }

    #[test]
    fn bookends_take_both_ends() -> anyhow::Result<()> {
        let bookends = pattern(SelectionPattern::Bookends { count: 2 });
        assert_eq!(bookends.resolve(7)?, vec![0, 1, 5, 6]);
        Ok(())
    }

    #[test]
    fn evenly_includes_first_and_last() -> anyhow::Result<()> {
        let evenly = pattern(SelectionPattern::Evenly { count: 3 });
        assert_eq!(evenly.resolve(10)?, vec![0, 5, 9]);

        let single = pattern(SelectionPattern::Evenly { count: 1 });
        assert_eq!(single.resolve(10)?, vec![0]);

        let saturated = pattern(SelectionPattern::Evenly { count: 20 });
        assert_eq!(saturated.resolve(4)?, vec![0, 1, 2, 3]);
        Ok(())
    }

    #[test]
    fn deserializes_tagged_json() -> anyhow::Result<()> {
        let selection: Selection = serde_json::from_str(
            r#"{"type": "pattern", "pattern": {"kind": "everyNth", "step": 2}}"#,
        )?;
        assert_eq!(
            selection,
            pattern(SelectionPattern::EveryNth { step: 2, offset: 0 })
        );

        let all: Selection = serde_json::from_str(r#"{"type": "all"}"#)?;
        assert_eq!(all, Selection::All);
        Ok(())
    }
}
