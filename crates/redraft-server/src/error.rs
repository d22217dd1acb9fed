//! Startup errors raised while building the [`ServiceState`].
//!
//! Request-time failures use the handler error instead.
//!
//! [`ServiceState`]: crate::service::ServiceState

/// Result type alias for building the service state.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Reasons the service state cannot be built.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A configured value is out of range or inconsistent.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// The HTTP client shared by the vendor adapters could not be created.
    #[error("failed to create the provider client")]
    ProviderClient(#[source] redraft_reqwest::Error),
}
