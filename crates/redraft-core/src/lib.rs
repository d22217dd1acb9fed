#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod error;

pub mod chunk;
pub mod detect;
#[cfg(any(test, feature = "test-utils"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-utils")))]
pub mod mock;
pub mod pipeline;
pub mod provider;
pub mod text;
pub mod transcribe;

pub use error::{BoxedError, Error, ErrorKind, Result};
pub use provider::{LanguageProvider, LanguageService, ProviderKind, ProviderRegistry};
