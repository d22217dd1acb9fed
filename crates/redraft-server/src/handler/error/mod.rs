//! [`Error`], [`ErrorKind`] and [`Result`].

mod core_error;
mod http_error;
mod job_error;

pub use http_error::{Error, ErrorKind, Result};
