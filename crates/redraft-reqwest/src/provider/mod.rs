//! Language model adapters.

mod anthropic;
mod openai;

pub use anthropic::AnthropicProvider;
pub use openai::OpenAiCompatibleProvider;

/// Tracing target for provider adapters.
pub const TRACING_TARGET: &str = "redraft_reqwest::provider";
