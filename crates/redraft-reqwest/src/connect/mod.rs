//! Shared HTTP client.
//!
//! Every vendor adapter sends its requests through one [`ReqwestClient`], so
//! connection pooling, the user agent and the default timeout are configured
//! in one place.

mod client;
mod config;

pub use client::{ReqwestClient, TRACING_TARGET};
pub use config::ReqwestConfig;
