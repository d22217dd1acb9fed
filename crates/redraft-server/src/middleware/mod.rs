//! Middleware for `axum::Router` and HTTP request processing.
//!
//! - Recovery: panics and request timeouts become error responses.
//! - Observability: request IDs, tracing spans and header redaction.
//! - Security: CORS, security headers and body size limits.
//! - Specification: the OpenAPI document and the Scalar API reference.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use axum::Router;
//! use redraft_server::middleware::{
//!     CorsConfig, RecoveryConfig, RouterObservabilityExt, RouterRecoveryExt, RouterSecurityExt,
//! };
//!
//! let app: Router = Router::new()
//!     .with_security(&CorsConfig::default())
//!     .with_observability()
//!     .with_recovery(&RecoveryConfig::default());
//! ```

mod observability;
mod recovery;
mod security;
mod specification;

pub use observability::RouterObservabilityExt;
pub use recovery::{RecoveryConfig, RouterRecoveryExt};
pub use security::{CorsConfig, DEFAULT_MAX_BODY_SIZE, RouterSecurityExt};
pub use specification::{OpenApiConfig, RouterOpenApiExt};
