#[cfg(feature = "config")]
use clap::Args;
use derive_builder::Builder;
use redraft_core::chunk::ChunkerConfig;
use redraft_core::pipeline::ProcessorConfig;
use redraft_reqwest::{ProviderConfig, ReqwestClient};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Default values for configuration options.
mod defaults {
    /// Default number of processing jobs kept in memory.
    pub const MAX_PROCESSING_JOBS: usize = 256;

    /// Default number of rewrite jobs kept in memory.
    pub const MAX_REWRITE_JOBS: usize = crate::service::DEFAULT_MAX_REWRITE_JOBS;

    pub fn max_processing_jobs() -> usize {
        MAX_PROCESSING_JOBS
    }

    pub fn max_rewrite_jobs() -> usize {
        MAX_REWRITE_JOBS
    }
}

/// App [`state`] configuration.
///
/// [`state`]: crate::service::ServiceState
#[derive(Debug, Clone, Serialize, Deserialize, Builder)]
#[cfg_attr(feature = "config", derive(Args))]
#[must_use = "config does nothing unless you use it"]
#[builder(
    pattern = "owned",
    setter(into, strip_option, prefix = "with"),
    build_fn(validate = "Self::validate")
)]
pub struct ServiceConfig {
    /// Chunk size thresholds.
    #[cfg_attr(feature = "config", command(flatten))]
    #[builder(default)]
    #[serde(default)]
    pub chunker: ChunkerConfig,

    /// Pacing of sequential processing.
    #[cfg_attr(feature = "config", command(flatten))]
    #[builder(default)]
    #[serde(default)]
    pub processor: ProcessorConfig,

    /// Vendor credentials, model overrides and timeouts.
    #[cfg_attr(feature = "config", command(flatten))]
    #[builder(default)]
    #[serde(default)]
    pub providers: ProviderConfig,

    /// Processing jobs kept in memory before the oldest finished ones are
    /// evicted.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "MAX_PROCESSING_JOBS", default_value = "256")
    )]
    #[builder(default = "defaults::MAX_PROCESSING_JOBS")]
    #[serde(default = "defaults::max_processing_jobs")]
    pub max_processing_jobs: usize,

    /// Rewrite jobs kept in memory before the least recently updated
    /// finished ones are evicted.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "MAX_REWRITE_JOBS", default_value = "1024")
    )]
    #[builder(default = "defaults::MAX_REWRITE_JOBS")]
    #[serde(default = "defaults::max_rewrite_jobs")]
    pub max_rewrite_jobs: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            chunker: ChunkerConfig::default(),
            processor: ProcessorConfig::default(),
            providers: ProviderConfig::default(),
            max_processing_jobs: defaults::MAX_PROCESSING_JOBS,
            max_rewrite_jobs: defaults::MAX_REWRITE_JOBS,
        }
    }
}

impl ServiceConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> ServiceConfigBuilder {
        ServiceConfigBuilder::default()
    }

    /// Validates values that the command line parser accepts unchecked.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if a limit is zero or the chunk
    /// thresholds are inconsistent.
    pub fn validate(&self) -> Result<()> {
        validate_limits(&self.chunker, self.max_processing_jobs, self.max_rewrite_jobs)
            .map_err(Error::InvalidConfig)
    }

    /// Creates the HTTP client shared by the vendor adapters.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ProviderClient`] if the client cannot be built.
    pub fn connect_providers(&self) -> Result<ReqwestClient> {
        self.providers.connect().map_err(Error::ProviderClient)
    }
}

impl ServiceConfigBuilder {
    /// Wrapper for builder validation that returns String errors.
    fn validate(builder: &ServiceConfigBuilder) -> std::result::Result<(), String> {
        let chunker = builder.chunker.unwrap_or_default();
        let max_processing_jobs = builder
            .max_processing_jobs
            .unwrap_or(defaults::MAX_PROCESSING_JOBS);
        let max_rewrite_jobs = builder
            .max_rewrite_jobs
            .unwrap_or(defaults::MAX_REWRITE_JOBS);

        validate_limits(&chunker, max_processing_jobs, max_rewrite_jobs)
    }
}

fn validate_limits(
    chunker: &ChunkerConfig,
    max_processing_jobs: usize,
    max_rewrite_jobs: usize,
) -> std::result::Result<(), String> {
    if max_processing_jobs == 0 {
        return Err("Maximum processing jobs must be greater than 0".to_owned());
    }

    if max_rewrite_jobs == 0 {
        return Err("Maximum rewrite jobs must be greater than 0".to_owned());
    }

    if chunker.baseline_words == 0 {
        return Err("Chunk baseline words must be greater than 0".to_owned());
    }

    if chunker.baseline_words > chunker.max_words {
        return Err(format!(
            "Chunk baseline words ({}) cannot exceed chunk max words ({})",
            chunker.baseline_words, chunker.max_words
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_uses_defaults() -> anyhow::Result<()> {
        let config = ServiceConfig::builder().build()?;
        assert_eq!(config.max_processing_jobs, 256);
        assert_eq!(config.max_rewrite_jobs, 1024);
        assert_eq!(config.chunker, ChunkerConfig::default());
        assert_eq!(config.processor.chunk_delay_secs, 15);
        Ok(())
    }

    #[test]
    fn builder_rejects_invalid_limits() {
        let result = ServiceConfig::builder().with_max_processing_jobs(0usize).build();
        assert!(result.is_err());

        let result = ServiceConfig::builder().with_max_rewrite_jobs(0usize).build();
        assert!(result.is_err());

        let chunker = ChunkerConfig::default()
            .with_baseline_words(5_000)
            .with_max_words(4_000);
        let result = ServiceConfig::builder().with_chunker(chunker).build();
        assert!(result.is_err());
    }

    #[test]
    fn validate_reports_config_errors() {
        let config = ServiceConfig {
            max_processing_jobs: 0,
            ..ServiceConfig::default()
        };

        let error = config.validate().err();
        assert!(matches!(error, Some(Error::InvalidConfig(message)) if message.contains("processing jobs")));
    }
}
