//! Internal error types for redraft-reqwest.

use redraft_core::ErrorKind;
use reqwest::StatusCode;
use thiserror::Error;

/// Result type alias for redraft-reqwest operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Internal error type for redraft-reqwest operations.
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Reqwest(#[from] reqwest::Error),
    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    /// The vendor answered with a non-success status.
    #[error("{status}: {message}")]
    Status {
        /// HTTP status returned by the vendor.
        status: StatusCode,
        /// Message extracted from the vendor's error body.
        message: String,
    },
    /// The vendor answered with a payload missing the expected content.
    #[error("unexpected response: {0}")]
    Response(String),
    /// Generation stopped at the output token limit, so the text is incomplete.
    #[error("response was cut off at the output token limit")]
    Truncated,
}

impl Error {
    /// Builds a status error from a vendor error body.
    pub(crate) fn status(status: StatusCode, body: &str) -> Self {
        Self::Status {
            status,
            message: vendor_message(body),
        }
    }

    /// Returns the core error kind this error maps to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Reqwest(e) if e.is_timeout() => ErrorKind::Timeout,
            Self::Reqwest(e) if e.is_connect() => ErrorKind::NetworkError,
            Self::Reqwest(e) if e.is_decode() => ErrorKind::Serialization,
            Self::Reqwest(_) => ErrorKind::NetworkError,
            Self::Serde(_) => ErrorKind::Serialization,
            Self::Status { status, .. } => match *status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ErrorKind::Authentication,
                StatusCode::TOO_MANY_REQUESTS => ErrorKind::RateLimited,
                StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => ErrorKind::Timeout,
                _ => ErrorKind::ExternalError,
            },
            Self::Response(_) | Self::Truncated => ErrorKind::ExternalError,
        }
    }
}

impl From<Error> for redraft_core::Error {
    fn from(err: Error) -> Self {
        let kind = err.kind();
        match err {
            Error::Reqwest(e) => {
                let message = match kind {
                    ErrorKind::Timeout => "request timed out".to_owned(),
                    ErrorKind::NetworkError if e.is_connect() => "connection failed".to_owned(),
                    _ => e.to_string(),
                };
                redraft_core::Error::new(kind)
                    .with_message(message)
                    .with_source(e)
            }
            Error::Serde(e) => redraft_core::Error::new(kind)
                .with_message(e.to_string())
                .with_source(e),
            Error::Status { status, message } => redraft_core::Error::new(kind)
                .with_message(format!("{} ({})", message, status.as_u16())),
            Error::Response(message) => redraft_core::Error::new(kind).with_message(message),
            Error::Truncated => redraft_core::Error::new(kind)
                .with_message("response was cut off at the output token limit"),
        }
    }
}

/// Extracts a human readable message from a vendor error body.
///
/// Understands `{"error": {"message": ...}}`, `{"error": "..."}` and
/// `{"message": ...}`, and falls back to the start of the raw body.
fn vendor_message(body: &str) -> String {
    const MAX_RAW_CHARS: usize = 200;

    if let Ok(json) = serde_json::from_str::<serde_json::Value>(body) {
        let message = ["/error/message", "/error", "/message", "/detail"]
            .into_iter()
            .find_map(|pointer| json.pointer(pointer).and_then(serde_json::Value::as_str));
        if let Some(message) = message {
            return message.to_owned();
        }
    }

    let raw = body.trim();
    if raw.is_empty() {
        return "empty error response".to_owned();
    }
    raw.chars().take(MAX_RAW_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_map_to_kinds() {
        let kind = |status| Error::status(status, "").kind();
        assert_eq!(kind(StatusCode::UNAUTHORIZED), ErrorKind::Authentication);
        assert_eq!(kind(StatusCode::TOO_MANY_REQUESTS), ErrorKind::RateLimited);
        assert_eq!(kind(StatusCode::GATEWAY_TIMEOUT), ErrorKind::Timeout);
        assert_eq!(kind(StatusCode::INTERNAL_SERVER_ERROR), ErrorKind::ExternalError);
    }

    #[test]
    fn vendor_messages_are_extracted() {
        assert_eq!(
            vendor_message(r#"{"error": {"message": "Rate limit reached", "type": "requests"}}"#),
            "Rate limit reached"
        );
        assert_eq!(vendor_message(r#"{"error": "invalid key"}"#), "invalid key");
        assert_eq!(vendor_message("<html>Bad gateway</html>"), "<html>Bad gateway</html>");
        assert_eq!(vendor_message("  "), "empty error response");
    }

    #[test]
    fn converts_into_core_error() {
        let error: redraft_core::Error =
            Error::status(StatusCode::TOO_MANY_REQUESTS, r#"{"message": "slow down"}"#).into();
        assert_eq!(error.kind, ErrorKind::RateLimited);
        assert_eq!(error.message.as_deref(), Some("slow down (429)"));
    }
}
