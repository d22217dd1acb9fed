use axum::extract::rejection::QueryRejection;
use axum::extract::{FromRequestParts, Query as AxumQuery};
use axum::http::request::Parts;
use derive_more::{Deref, DerefMut, From};
use serde::de::DeserializeOwned;

use super::TRACING_TARGET;
use crate::handler::{Error, ErrorKind};

/// Query parameter extractor with descriptive rejections.
///
/// Missing, duplicated and mistyped parameters are named in the error
/// context when the deserializer reports them.
#[must_use]
#[derive(Debug, Clone, Copy, Default, Deref, DerefMut, From)]
pub struct Query<T>(pub T);

impl<T> Query<T> {
    /// Creates a new [`Query`] wrapper around the provided query parameters.
    #[inline]
    pub fn new(inner: T) -> Self {
        Self(inner)
    }

    /// Consumes the wrapper and returns the inner query parameters.
    #[inline]
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T, S> FromRequestParts<S> for Query<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Error<'static>;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match AxumQuery::<T>::from_request_parts(parts, state).await {
            Ok(AxumQuery(query)) => Ok(Query(query)),
            Err(rejection) => Err(enhance_query_error(rejection)),
        }
    }
}

/// Converts a query rejection into an error naming the offending parameter.
fn enhance_query_error(rejection: QueryRejection) -> Error<'static> {
    tracing::debug!(
        target: TRACING_TARGET,
        error = %rejection,
        "Query parameter parsing failed"
    );

    let QueryRejection::FailedToDeserializeQueryString(err) = rejection else {
        return ErrorKind::BadRequest
            .with_message("Invalid query parameters")
            .with_context("The query string could not be parsed");
    };

    let error_message = err.body_text();
    let field_name = extract_field_name_from_error(&error_message).unwrap_or("unknown");

    if error_message.contains("missing field") {
        ErrorKind::BadRequest
            .with_message("Missing required query parameter")
            .with_context(format!("The query parameter '{field_name}' is required"))
    } else if error_message.contains("duplicate field") {
        ErrorKind::BadRequest
            .with_message("Duplicate query parameter")
            .with_context(format!(
                "The query parameter '{field_name}' was provided more than once"
            ))
    } else {
        ErrorKind::BadRequest
            .with_message("Invalid query parameters")
            .with_context(format!("Failed to parse query string: {error_message}"))
    }
}

/// Extracts the field name from a serde error message, if it names one.
fn extract_field_name_from_error(error_message: &str) -> Option<&str> {
    if let Some(start) = error_message.find('`')
        && let Some(end) = error_message[start + 1..].find('`')
    {
        return Some(&error_message[start + 1..start + 1 + end]);
    }

    let start = error_message.find("field ")?;
    let field_part = &error_message[start + 6..];
    field_part.find(' ').map(|end| &field_part[..end])
}

impl<T> aide::OperationInput for Query<T>
where
    T: schemars::JsonSchema,
{
    fn operation_input(
        ctx: &mut aide::generate::GenContext,
        operation: &mut aide::openapi::Operation,
    ) {
        AxumQuery::<T>::operation_input(ctx, operation);
    }
}
