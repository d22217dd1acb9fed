//! Common error type definitions.

use std::fmt;

use strum::{AsRefStr, IntoStaticStr};
use thiserror::Error;

use crate::provider::ProviderKind;

/// Type alias for boxed dynamic errors that can be sent across threads.
pub type BoxedError = Box<dyn std::error::Error + Send + Sync>;

/// Type alias for Results with our custom Error type.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Categories of errors that can occur while rewriting documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    /// Input validation failed.
    InvalidInput,
    /// A provider or service is not configured.
    Configuration,
    /// Network-related error occurred.
    NetworkError,
    /// Timeout occurred.
    Timeout,
    /// The vendor rejected the request because of its rate limits.
    RateLimited,
    /// The vendor rejected the configured credentials.
    Authentication,
    /// The vendor returned an error or an unusable response.
    ExternalError,
    /// Serialization/deserialization error.
    Serialization,
    /// Resource not found.
    NotFound,
    /// The operation was cancelled before it finished.
    Cancelled,
    /// Internal error.
    InternalError,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

/// A structured error type for rewriting operations.
///
/// Errors raised by a vendor adapter carry the [`ProviderKind`] so the
/// rendered message is provider-qualified, e.g. `anthropic: rate_limited: ...`.
#[derive(Debug, Error)]
#[error(
    "{}{kind}{}",
    provider.map(|p| format!("{p}: ")).unwrap_or_default(),
    message.as_ref().map(|m| format!(": {m}")).unwrap_or_default()
)]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional error message.
    pub message: Option<String>,
    /// Provider that produced the error, if any.
    pub provider: Option<ProviderKind>,
    /// Optional source error.
    #[source]
    pub source: Option<BoxedError>,
}

impl Error {
    /// Creates a new error with the given kind.
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            provider: None,
            source: None,
        }
    }

    /// Adds a message to this error.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Attributes this error to a provider.
    pub fn with_provider(mut self, provider: ProviderKind) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Adds a source error to this error.
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Creates a new invalid input error.
    pub fn invalid_input() -> Self {
        Self::new(ErrorKind::InvalidInput)
    }

    /// Creates a new configuration error.
    pub fn configuration() -> Self {
        Self::new(ErrorKind::Configuration)
    }

    /// Creates a new network error.
    pub fn network_error() -> Self {
        Self::new(ErrorKind::NetworkError)
    }

    /// Creates a new timeout error.
    pub fn timeout() -> Self {
        Self::new(ErrorKind::Timeout)
    }

    /// Creates a new rate limited error.
    pub fn rate_limited() -> Self {
        Self::new(ErrorKind::RateLimited)
    }

    /// Creates a new authentication error.
    pub fn authentication() -> Self {
        Self::new(ErrorKind::Authentication)
    }

    /// Creates a new external error.
    pub fn external_error() -> Self {
        Self::new(ErrorKind::ExternalError)
    }

    /// Creates a new serialization error.
    pub fn serialization() -> Self {
        Self::new(ErrorKind::Serialization)
    }

    /// Creates a new not found error.
    pub fn not_found() -> Self {
        Self::new(ErrorKind::NotFound)
    }

    /// Creates a new cancellation error.
    pub fn cancelled() -> Self {
        Self::new(ErrorKind::Cancelled)
    }

    /// Creates a new internal error.
    pub fn internal_error() -> Self {
        Self::new(ErrorKind::InternalError)
    }

    /// Returns the message, or the kind name when no message was attached.
    pub fn message_or_kind(&self) -> &str {
        self.message.as_deref().unwrap_or(self.kind.as_ref())
    }

    /// Returns true if this is a client error (4xx equivalent).
    pub fn is_client_error(&self) -> bool {
        matches!(self.kind, ErrorKind::InvalidInput | ErrorKind::NotFound)
    }

    /// Returns true if this error is potentially retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::NetworkError | ErrorKind::RateLimited | ErrorKind::Timeout
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::serialization()
            .with_message(err.to_string())
            .with_source(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_without_provider() {
        let error = Error::invalid_input().with_message("text is empty");
        assert_eq!(error.to_string(), "invalid_input: text is empty");
    }

    #[test]
    fn display_is_provider_qualified() {
        let error = Error::rate_limited()
            .with_provider(ProviderKind::Anthropic)
            .with_message("slow down");
        assert_eq!(error.to_string(), "anthropic: rate_limited: slow down");
    }

    #[test]
    fn retryable_kinds() {
        assert!(Error::timeout().is_retryable());
        assert!(Error::network_error().is_retryable());
        assert!(!Error::authentication().is_retryable());
        assert!(!Error::configuration().is_retryable());
    }

    #[test]
    fn message_falls_back_to_kind() {
        assert_eq!(Error::cancelled().message_or_kind(), "cancelled");
    }

    #[test]
    fn source_is_preserved() {
        let source = std::io::Error::other("boom");
        let error = Error::internal_error().with_source(source);
        assert!(std::error::Error::source(&error).is_some());
    }
}
