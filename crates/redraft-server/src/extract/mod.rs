//! Request extractors that turn axum rejections into structured error
//! responses.
//!
//! - [`Json`]: JSON body with descriptive deserialization errors
//! - [`ValidateJson`]: JSON body checked with `validator` after parsing
//! - [`Path`]: path parameters, such as job identifiers
//! - [`Query`]: query string parameters
//! - [`Multipart`]: multipart form data for audio uploads

pub mod reject;

pub use crate::extract::reject::{Json, Multipart, Path, Query, ValidateJson};
