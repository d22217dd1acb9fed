//! Request types for HTTP handlers.

mod bypass;
mod chat;
mod detection;
mod documents;
mod homework;
mod paths;
mod text;
mod validations;

pub use bypass::*;
pub use chat::*;
pub use detection::*;
pub use documents::*;
pub use homework::*;
pub use paths::*;
pub use text::*;
pub use validations::*;
