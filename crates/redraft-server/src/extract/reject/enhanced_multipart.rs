//! Multipart extractor with descriptive rejections.
//!
//! Only the transcription endpoint accepts multipart bodies. Both the initial
//! rejection and errors raised while reading fields map to `400 bad_request`.

use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::{FromRequest, Multipart as AxumMultipart, Request};
use derive_more::{Deref, DerefMut, From};

use super::{TRACING_TARGET, sanitize_error_message};
use crate::handler::{Error, ErrorKind};

/// Multipart form extractor.
#[must_use]
#[derive(Debug, Deref, DerefMut, From)]
pub struct Multipart(pub AxumMultipart);

impl Multipart {
    /// Returns the inner axum multipart extractor.
    #[inline]
    pub fn into_inner(self) -> AxumMultipart {
        self.0
    }
}

impl<S> FromRequest<S> for Multipart
where
    S: Send + Sync,
{
    type Rejection = Error<'static>;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        AxumMultipart::from_request(req, state)
            .await
            .map(Multipart)
            .map_err(Into::into)
    }
}

impl From<MultipartRejection> for Error<'static> {
    fn from(rejection: MultipartRejection) -> Self {
        tracing::debug!(
            target: TRACING_TARGET,
            error = %rejection,
            "Multipart request rejected"
        );

        match rejection {
            MultipartRejection::InvalidBoundary(_) => ErrorKind::BadRequest
                .with_message("Invalid multipart boundary")
                .with_context(
                    "The request must use 'multipart/form-data' with a valid boundary parameter",
                ),
            _ => ErrorKind::BadRequest
                .with_message("Invalid multipart request")
                .with_context(format!("Multipart parsing failed: {rejection}")),
        }
    }
}

impl From<MultipartError> for Error<'static> {
    fn from(error: MultipartError) -> Self {
        let status = error.status();
        let context = sanitize_error_message(&error.body_text(), 2, 200);

        tracing::debug!(
            target: TRACING_TARGET,
            error = %context,
            status = %status,
            "Multipart field could not be read"
        );

        if status == axum::http::StatusCode::PAYLOAD_TOO_LARGE {
            ErrorKind::PayloadTooLarge
                .with_message("Uploaded file is too large")
                .with_context(context)
        } else {
            ErrorKind::BadRequest
                .with_message("Failed to read multipart field")
                .with_context(context)
        }
    }
}

impl aide::OperationInput for Multipart {
    fn operation_input(
        ctx: &mut aide::generate::GenContext,
        operation: &mut aide::openapi::Operation,
    ) {
        AxumMultipart::operation_input(ctx, operation);
    }
}
