//! Monitor response types.

use jiff::Timestamp;
use redraft_core::ProviderKind;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Service health.
#[must_use]
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    /// True if at least one language model provider is configured.
    pub is_healthy: bool,
    /// Timestamp when this status was generated.
    pub updated_at: Timestamp,
    /// Configured language model providers.
    pub providers: Vec<ProviderKind>,
    /// Application version.
    pub version: String,
}

impl HealthStatus {
    /// Creates a status for the configured providers.
    pub fn new(providers: Vec<ProviderKind>) -> Self {
        Self {
            is_healthy: !providers.is_empty(),
            updated_at: Timestamp::now(),
            providers,
            version: env!("CARGO_PKG_VERSION").to_owned(),
        }
    }
}
