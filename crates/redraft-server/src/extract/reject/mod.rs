//! Drop-in replacements for the axum extractors.
//!
//! Each extractor delegates to its axum counterpart and maps the rejection
//! into the handler [`Error`], so clients always receive an
//! [`ErrorResponse`] body.
//!
//! [`Error`]: crate::handler::Error
//! [`ErrorResponse`]: crate::handler::response::ErrorResponse

pub mod enhanced_json;
pub mod enhanced_multipart;
pub mod enhanced_path;
pub mod enhanced_query;
pub mod validated_json;

pub use self::enhanced_json::Json;
pub use self::enhanced_multipart::Multipart;
pub use self::enhanced_path::Path;
pub use self::enhanced_query::Query;
pub use self::validated_json::ValidateJson;

/// Tracing target for request extraction.
const TRACING_TARGET: &str = "redraft_server::extract";

/// Keeps the first lines of a rejection message and caps its length.
fn sanitize_error_message(message: &str, max_lines: usize, max_chars: usize) -> String {
    message
        .lines()
        .take(max_lines)
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .take(max_chars)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_limits_lines_and_length() {
        let message = "first line\nsecond line\nthird line";
        assert_eq!(sanitize_error_message(message, 2, 100), "first line second line");
        assert_eq!(sanitize_error_message(message, 3, 5), "first");
    }
}
