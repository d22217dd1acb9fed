use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Lifecycle of a processing job.
///
/// ```text
/// idle → chunking → awaitingSelection → processing{index,total} → … → completed
///                                      ↘ cancelled
///                                      ↘ failed
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum JobState {
    /// Created, nothing submitted yet.
    #[default]
    Idle,
    /// The document is being split.
    Chunking,
    /// Chunks are ready and the client must choose what to process.
    AwaitingSelection,
    /// A chunk is being processed.
    Processing {
        /// Position of the current chunk within the selection.
        index: usize,
        /// Number of steps in the run.
        total: usize,
    },
    /// Every step finished.
    Completed,
    /// The client cancelled the run.
    Cancelled,
    /// A step failed and the run was aborted.
    Failed,
}

impl JobState {
    /// Returns true if the job can move from `self` to `next`.
    pub fn can_transition_to(&self, next: &Self) -> bool {
        use JobState::*;

        match (self, next) {
            (Idle, Chunking) => true,
            (Chunking, AwaitingSelection) => true,
            (Chunking, Failed) => true,
            (AwaitingSelection, Processing { index: 0, total }) => *total > 0,
            (AwaitingSelection, Completed) => true,
            (AwaitingSelection, Cancelled) => true,
            (
                Processing { index, total },
                Processing {
                    index: next_index,
                    total: next_total,
                },
            ) => total == next_total && *next_index == index + 1 && next_index < total,
            (Processing { .. }, Completed | Cancelled | Failed) => true,
            _ => false,
        }
    }

    /// Moves to `next`, rejecting edges the state machine does not allow.
    ///
    /// # Errors
    ///
    /// Returns an invalid input error for a disallowed transition.
    pub fn transition(&mut self, next: Self) -> Result<()> {
        if !self.can_transition_to(&next) {
            return Err(Error::invalid_input().with_message(format!(
                "job cannot move from {} to {}",
                self.name(),
                next.name()
            )));
        }
        *self = next;
        Ok(())
    }

    /// Returns true if no further transition is possible.
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Failed)
    }

    /// Returns true while chunks are being dispatched.
    pub const fn is_processing(&self) -> bool {
        matches!(self, Self::Processing { .. })
    }

    /// Returns the camelCase state name.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Chunking => "chunking",
            Self::AwaitingSelection => "awaitingSelection",
            Self::Processing { .. } => "processing",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
        }
    }
}
