//! All `axum::`[`Router`]s with related `axum::`[`Handler`]s.
//!
//! # Usage Example
//!
//! ```rust,no_run
//! use axum::Router;
//! use redraft_server::handler::routes;
//! use redraft_server::middleware::{OpenApiConfig, RouterOpenApiExt};
//! use redraft_server::service::{ServiceConfig, ServiceState};
//!
//! # fn example() -> anyhow::Result<()> {
//! let state = ServiceState::from_config(&ServiceConfig::default())?;
//! let router: Router = routes()
//!     .with_open_api(OpenApiConfig::default())
//!     .with_state(state);
//! # Ok(())
//! # }
//! ```
//!
//! [`Router`]: axum::routing::Router
//! [`Handler`]: axum::handler::Handler

mod bypass;
mod chat;
mod detection;
mod documents;
mod error;
mod homework;
mod monitors;
pub mod request;
pub mod response;
mod text;
mod transcription;

use aide::axum::ApiRouter;
use axum::response::{IntoResponse, Response};

pub use crate::handler::error::{Error, ErrorKind, Result};
use crate::service::ServiceState;

#[inline]
async fn handler() -> Response {
    ErrorKind::NotFound.into_response()
}

/// Returns an [`ApiRouter`] with all routes.
pub fn routes() -> ApiRouter<ServiceState> {
    ApiRouter::new()
        .merge(text::routes())
        .merge(detection::routes())
        .merge(transcription::routes())
        .merge(chat::routes())
        .merge(homework::routes())
        .merge(bypass::routes())
        .merge(documents::routes())
        .merge(monitors::routes())
        .fallback(handler)
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use aide::axum::ApiRouter;
    use axum::Router;
    use axum_test::TestServer;
    use redraft_core::detect::AiDetector;
    use redraft_core::mock::MockProvider;
    use redraft_core::pipeline::ProcessorConfig;
    use redraft_core::transcribe::Transcriber;
    use redraft_core::{ProviderKind, ProviderRegistry};
    use strum::IntoEnumIterator;

    use crate::handler::routes;
    use crate::service::{ServiceConfig, ServiceState};

    /// Returns a configuration without pacing between chunks.
    fn test_config() -> ServiceConfig {
        ServiceConfig {
            processor: ProcessorConfig::default().with_chunk_delay_secs(0),
            ..ServiceConfig::default()
        }
    }

    /// Returns a registry with an echoing mock for every provider.
    fn echo_registry() -> ProviderRegistry {
        ProviderKind::iter()
            .filter(|kind| *kind != ProviderKind::Perplexity)
            .fold(ProviderRegistry::new(), |registry, kind| {
                registry.with_provider(MockProvider::echo(kind))
            })
    }

    /// Returns a state over `registry` without detector or transcriber.
    pub fn test_state_from_registry(registry: ProviderRegistry) -> ServiceState {
        ServiceState::with_providers(&test_config(), registry, None, None)
    }

    /// Returns a state over echoing providers with the given vendor services.
    pub fn test_state_with(
        detector: Option<Arc<dyn AiDetector>>,
        transcriber: Option<Arc<dyn Transcriber>>,
    ) -> ServiceState {
        ServiceState::with_providers(&test_config(), echo_registry(), detector, transcriber)
    }

    /// Returns a new [`TestServer`] with the given router.
    pub fn create_test_server_with_router(
        router: impl Fn(ServiceState) -> ApiRouter<ServiceState>,
    ) -> anyhow::Result<TestServer> {
        create_test_server_with_state(router, test_state_with(None, None))
    }

    /// Returns a new [`TestServer`] with the given router and state.
    pub fn create_test_server_with_state(
        router: impl Fn(ServiceState) -> ApiRouter<ServiceState>,
        state: ServiceState,
    ) -> anyhow::Result<TestServer> {
        let app: Router = router(state.clone()).with_state(state).into();
        let server = TestServer::new(app)?;
        Ok(server)
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() -> anyhow::Result<()> {
        let server = create_test_server_with_router(|_| routes())?;

        let response = server.get("/api/unknown").await;
        response.assert_status_not_found();

        let body = response.json::<serde_json::Value>();
        assert_eq!(body["name"], "not_found");
        Ok(())
    }
}
