//! Handler error type.

use std::borrow::Cow;
use std::fmt;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::handler::response::ErrorResponse;

/// Specialized [`Result`] for HTTP handlers.
///
/// [`Result`]: std::result::Result
pub type Result<T, E = Error<'static>> = std::result::Result<T, E>;

/// Error returned by every handler.
///
/// The [`ErrorKind`] picks the status code and the default message of the
/// response. The optional parts refine that template: `message` is appended
/// to the default message, `resource` names what failed (a provider, a job,
/// a form field) and `context` carries the underlying cause.
#[derive(Debug, Clone, aide::OperationIo)]
#[aide(output)]
#[must_use = "errors do nothing unless serialized"]
pub struct Error<'a> {
    kind: ErrorKind,
    message: Option<Cow<'a, str>>,
    resource: Option<Cow<'a, str>>,
    context: Option<Cow<'a, str>>,
}

impl<'a> Error<'a> {
    /// Creates an error of the given kind with the default message.
    #[inline]
    pub const fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            resource: None,
            context: None,
        }
    }

    /// Shorthand for a missing entity, e.g. an unknown job id.
    pub fn not_found(resource: impl Into<Cow<'a, str>>, message: impl Into<Cow<'a, str>>) -> Self {
        Self::new(ErrorKind::NotFound)
            .with_resource(resource)
            .with_message(message)
    }

    /// Shorthand for a rejected request field.
    pub fn bad_request(resource: impl Into<Cow<'a, str>>, message: impl Into<Cow<'a, str>>) -> Self {
        Self::new(ErrorKind::BadRequest)
            .with_resource(resource)
            .with_message(message)
    }

    #[inline]
    pub fn with_message(mut self, message: impl Into<Cow<'a, str>>) -> Self {
        self.message = Some(message.into());
        self
    }

    #[inline]
    pub fn with_resource(mut self, resource: impl Into<Cow<'a, str>>) -> Self {
        self.resource = Some(resource.into());
        self
    }

    #[inline]
    pub fn with_context(mut self, context: impl Into<Cow<'a, str>>) -> Self {
        self.context = Some(context.into());
        self
    }

    #[inline]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    #[inline]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    #[inline]
    pub fn resource(&self) -> Option<&str> {
        self.resource.as_deref()
    }

    #[inline]
    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }

    /// Builds the response body: the kind's template refined by the optional
    /// message, resource and context.
    pub fn to_response(&self) -> ErrorResponse<'a> {
        let mut response: ErrorResponse<'a> = self.kind.response();
        if let Some(message) = &self.message {
            response = response.with_message(message.clone());
        }
        if let Some(resource) = &self.resource {
            response = response.with_resource(resource.clone());
        }
        if let Some(context) = &self.context {
            response = response.with_context(context.clone());
        }
        response
    }
}

impl fmt::Display for Error<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let response = self.to_response();
        write!(f, "{} ({}): {}", response.name, response.status.as_u16(), response.message)?;

        if let Some(context) = &response.context {
            write!(f, " - {context}")?;
        }
        if let Some(resource) = &response.resource {
            write!(f, " [resource: {resource}]")?;
        }

        Ok(())
    }
}

impl std::error::Error for Error<'_> {}

impl IntoResponse for Error<'_> {
    #[inline]
    fn into_response(self) -> Response {
        self.to_response().into_response()
    }
}

impl From<ErrorKind> for Error<'static> {
    #[inline]
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}

/// HTTP error kinds returned by the API.
#[must_use = "error kinds do nothing unless used to create errors"]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// 400, a path segment could not be parsed.
    MissingPathParam,
    /// 400, the body, query or multipart form is invalid.
    BadRequest,
    /// 404
    NotFound,
    /// 409, the job is not in a state that allows the operation.
    Conflict,
    /// 413
    PayloadTooLarge,
    /// 429, a vendor rate limit or the job capacity was hit.
    TooManyRequests,
    /// 500
    #[default]
    InternalServerError,
    /// 502, a language model or vendor service failed.
    BadGateway,
    /// 503, the requested provider is not configured.
    ServiceUnavailable,
    /// 504, a vendor call or the whole request timed out.
    GatewayTimeout,
}

impl ErrorKind {
    /// Creates an [`Error`] of this kind with a custom message.
    #[inline]
    pub fn with_message<'a>(self, message: impl Into<Cow<'a, str>>) -> Error<'a> {
        Error::new(self).with_message(message)
    }

    /// Creates an [`Error`] of this kind naming the failed resource.
    #[inline]
    pub fn with_resource<'a>(self, resource: impl Into<Cow<'a, str>>) -> Error<'a> {
        Error::new(self).with_resource(resource)
    }

    /// Creates an [`Error`] of this kind with the underlying cause.
    #[inline]
    pub fn with_context<'a>(self, context: impl Into<Cow<'a, str>>) -> Error<'a> {
        Error::new(self).with_context(context)
    }

    #[inline]
    pub fn status_code(self) -> StatusCode {
        self.response().status
    }

    /// Returns the response template of this kind.
    pub const fn response(self) -> ErrorResponse<'static> {
        match self {
            Self::MissingPathParam => ErrorResponse::MISSING_PATH_PARAM,
            Self::BadRequest => ErrorResponse::BAD_REQUEST,
            Self::NotFound => ErrorResponse::NOT_FOUND,
            Self::Conflict => ErrorResponse::CONFLICT,
            Self::PayloadTooLarge => ErrorResponse::PAYLOAD_TOO_LARGE,
            Self::TooManyRequests => ErrorResponse::TOO_MANY_REQUESTS,
            Self::InternalServerError => ErrorResponse::INTERNAL_SERVER_ERROR,
            Self::BadGateway => ErrorResponse::BAD_GATEWAY,
            Self::ServiceUnavailable => ErrorResponse::SERVICE_UNAVAILABLE,
            Self::GatewayTimeout => ErrorResponse::GATEWAY_TIMEOUT,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.response().name)
    }
}

impl IntoResponse for ErrorKind {
    #[inline]
    fn into_response(self) -> Response {
        self.response().into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_shorthand() {
        let error = Error::not_found("rewrite_job", "Rewrite job not found")
            .with_context("id: 0190a0e8");

        assert_eq!(error.kind(), ErrorKind::NotFound);
        assert_eq!(error.message(), Some("Rewrite job not found"));
        assert_eq!(error.resource(), Some("rewrite_job"));
        assert_eq!(error.context(), Some("id: 0190a0e8"));
        assert_eq!(error.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn response_refines_template() {
        let response = ErrorKind::Conflict
            .with_message("Job is running")
            .to_response();

        assert_eq!(response.name, "conflict");
        assert_eq!(response.message, "Resource state conflict. Job is running");
        assert!(response.resource.is_none());
    }

    #[test]
    fn display_includes_status_and_details() {
        let error = ErrorKind::ServiceUnavailable
            .with_message("anthropic provider is not configured")
            .with_resource("anthropic");

        let display = error.to_string();
        assert!(display.starts_with("service_unavailable (503)"));
        assert!(display.contains("anthropic provider is not configured"));
        assert!(display.ends_with("[resource: anthropic]"));
    }

    #[test]
    fn status_codes() {
        let expected = [
            (ErrorKind::MissingPathParam, 400),
            (ErrorKind::BadRequest, 400),
            (ErrorKind::NotFound, 404),
            (ErrorKind::Conflict, 409),
            (ErrorKind::PayloadTooLarge, 413),
            (ErrorKind::TooManyRequests, 429),
            (ErrorKind::InternalServerError, 500),
            (ErrorKind::BadGateway, 502),
            (ErrorKind::ServiceUnavailable, 503),
            (ErrorKind::GatewayTimeout, 504),
        ];

        for (kind, status) in expected {
            assert_eq!(kind.status_code().as_u16(), status, "{kind:?}");
        }
        assert_eq!(ErrorKind::default(), ErrorKind::InternalServerError);
    }
}
