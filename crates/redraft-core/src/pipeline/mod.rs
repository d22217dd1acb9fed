//! Chunk dispatch and sequential processing.
//!
//! The [`Dispatcher`] sends one piece of text to a provider, wrapping the call
//! with math protection and dollar cleaning. The [`SequentialProcessor`] walks
//! the selected chunks of a document one at a time, pausing between requests,
//! reporting progress to a [`ProgressSink`] and honoring cancellation.

mod dispatcher;
mod processor;
mod state;

pub use dispatcher::{Dispatcher, RewriteOptions};
pub use processor::{
    NoopProgress, ProcessingMode, ProcessingOutcome, ProcessingPlan, ProcessorConfig, Progress,
    ProgressSink, SequentialProcessor,
};
pub use state::JobState;

/// Tracing target for pipeline operations.
pub const TRACING_TARGET: &str = "redraft_core::pipeline";
