//! Response types for HTTP handlers.

mod bypass;
mod chat;
mod documents;
mod errors;
mod monitors;
mod text;

pub use bypass::*;
pub use chat::*;
pub use documents::*;
pub use errors::*;
pub use monitors::*;
pub use text::*;
