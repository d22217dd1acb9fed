//! Health monitoring handler.

use aide::axum::ApiRouter;
use aide::transform::TransformOperation;
use axum::extract::State;
use axum::http::StatusCode;
use redraft_core::pipeline::Dispatcher;

use crate::extract::Json;
use crate::handler::Result;
use crate::handler::response::HealthStatus;
use crate::service::ServiceState;

/// Tracing target for monitor operations.
const TRACING_TARGET: &str = "redraft_server::handler::monitors";

#[tracing::instrument(skip_all)]
async fn health_status(
    State(dispatcher): State<Dispatcher>,
) -> Result<(StatusCode, Json<HealthStatus>)> {
    let response = HealthStatus::new(dispatcher.registry().available());

    let status_code = if response.is_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    tracing::debug!(
        target: TRACING_TARGET,
        is_healthy = response.is_healthy,
        providers = ?response.providers,
        status_code = status_code.as_u16(),
        "Health status response prepared"
    );

    Ok((status_code, Json(response)))
}

fn health_status_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Get health status")
        .description("Reports the configured language model providers.")
        .response::<200, Json<HealthStatus>>()
        .response::<503, Json<HealthStatus>>()
}

/// Returns a [`Router`] with all health monitoring routes.
///
/// [`Router`]: axum::routing::Router
pub fn routes() -> ApiRouter<ServiceState> {
    use aide::axum::routing::*;

    ApiRouter::new()
        .api_route("/health", get_with(health_status, health_status_docs))
        .with_path_items(|item| item.tag("Monitors"))
}

#[cfg(test)]
mod tests {
    use redraft_core::{ProviderKind, ProviderRegistry};

    use super::*;
    use crate::handler::test::{
        create_test_server_with_router, create_test_server_with_state, test_state_from_registry,
    };

    #[tokio::test]
    async fn healthy_with_providers() -> anyhow::Result<()> {
        let server = create_test_server_with_router(|_| routes())?;

        let response = server.get("/health").await;
        response.assert_status_ok();

        let status = response.json::<HealthStatus>();
        assert!(status.is_healthy);
        assert!(status.providers.contains(&ProviderKind::OpenAi));
        assert!(!status.version.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn unhealthy_without_providers() -> anyhow::Result<()> {
        let state = test_state_from_registry(ProviderRegistry::new());
        let server = create_test_server_with_state(|_| routes(), state)?;

        let response = server.get("/health").await;
        response.assert_status(StatusCode::SERVICE_UNAVAILABLE);

        let status = response.json::<HealthStatus>();
        assert!(!status.is_healthy);
        assert!(status.providers.is_empty());
        Ok(())
    }
}
