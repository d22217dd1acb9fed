//! Server startup and runtime errors.

use std::io;

/// Result type for server operations.
pub type Result<T, E = ServerError> = std::result::Result<T, E>;

/// Errors that stop the HTTP server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// The server configuration failed validation.
    #[error("invalid server configuration: {0}")]
    InvalidConfig(String),

    /// The listener could not bind the configured address.
    #[error("failed to bind to {address}")]
    Bind {
        address: String,
        #[source]
        source: io::Error,
    },

    /// The server failed while serving connections.
    #[error("server runtime error")]
    Runtime(#[source] io::Error),
}

impl ServerError {
    /// Returns a stable code for the error.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::Bind { .. } => "BIND_ERROR",
            Self::Runtime(_) => "RUNTIME_ERROR",
        }
    }

    /// Returns a human-readable hint for resolving the error, if one applies.
    #[must_use]
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::InvalidConfig(_) => Some("Check the server arguments and environment variables"),
            Self::Bind { source, .. } | Self::Runtime(source) => io_suggestion(source),
        }
    }
}

fn io_suggestion(err: &io::Error) -> Option<&'static str> {
    match err.kind() {
        io::ErrorKind::PermissionDenied => {
            Some("Try using a port above 1024 or run with appropriate privileges")
        }
        io::ErrorKind::AddrInUse => {
            Some("The port is already in use. Try a different port or stop the conflicting service")
        }
        io::ErrorKind::AddrNotAvailable => {
            Some("The address is not available. Check network interface configuration")
        }
        _ => None,
    }
}
