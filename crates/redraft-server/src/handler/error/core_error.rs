//! Conversion of pipeline and provider errors into HTTP errors.

use redraft_core::ErrorKind as CoreErrorKind;

use super::http_error::{Error as HttpError, ErrorKind};

/// Tracing target for core error conversions.
const TRACING_TARGET: &str = "redraft_server::handler::error";

impl From<redraft_core::Error> for HttpError<'static> {
    fn from(error: redraft_core::Error) -> Self {
        let provider = error.provider;

        match error.kind {
            CoreErrorKind::InvalidInput | CoreErrorKind::NotFound | CoreErrorKind::Cancelled => {
                tracing::debug!(
                    target: TRACING_TARGET,
                    error = %error,
                    error_kind = %error.kind,
                    "Request rejected"
                );
            }
            CoreErrorKind::NetworkError
            | CoreErrorKind::Timeout
            | CoreErrorKind::RateLimited
            | CoreErrorKind::ExternalError => {
                tracing::warn!(
                    target: TRACING_TARGET,
                    error = %error,
                    error_kind = %error.kind,
                    "Provider request failed"
                );
            }
            CoreErrorKind::Configuration | CoreErrorKind::Authentication => {
                tracing::error!(
                    target: TRACING_TARGET,
                    error = %error,
                    error_kind = %error.kind,
                    "Provider is misconfigured"
                );
            }
            CoreErrorKind::Serialization | CoreErrorKind::InternalError => {
                tracing::error!(
                    target: TRACING_TARGET,
                    error = %error,
                    error_kind = %error.kind,
                    "Unexpected processing failure"
                );
            }
        }

        let message = match provider {
            Some(provider) => format!("{}: {}", provider.display_name(), error.message_or_kind()),
            None => error.message_or_kind().to_owned(),
        };

        let http_error = match error.kind {
            CoreErrorKind::InvalidInput => ErrorKind::BadRequest.with_message(message),
            CoreErrorKind::NotFound => ErrorKind::NotFound.with_message(message),
            CoreErrorKind::Cancelled => ErrorKind::Conflict.with_message(message),
            CoreErrorKind::Configuration => ErrorKind::ServiceUnavailable.with_message(message),
            CoreErrorKind::RateLimited => ErrorKind::TooManyRequests
                .with_message(message)
                .with_context("The provider rejected the request because of its rate limit"),
            CoreErrorKind::Authentication => ErrorKind::BadGateway
                .with_message(message)
                .with_context("The provider rejected the configured API key"),
            CoreErrorKind::NetworkError
            | CoreErrorKind::ExternalError
            | CoreErrorKind::Serialization => ErrorKind::BadGateway.with_message(message),
            CoreErrorKind::Timeout => ErrorKind::GatewayTimeout.with_message(message),
            CoreErrorKind::InternalError => ErrorKind::InternalServerError.with_message(message),
        };

        match provider {
            Some(provider) => http_error.with_resource(provider.as_str()),
            None => http_error,
        }
    }
}
