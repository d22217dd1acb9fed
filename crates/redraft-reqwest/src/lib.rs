#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod config;
mod connect;
mod detect;
mod error;
mod provider;
mod transcribe;

pub use crate::config::ProviderConfig;
pub use crate::connect::{ReqwestClient, ReqwestConfig, TRACING_TARGET};
pub use crate::detect::GptZeroDetector;
pub use crate::error::{Error, Result};
pub use crate::provider::{AnthropicProvider, OpenAiCompatibleProvider};
pub use crate::transcribe::WhisperTranscriber;
