//! CLI configuration management.
//!
//! ```text
//! Cli
//! ├── server: ServerConfig         # Host, port, shutdown
//! ├── middleware: MiddlewareConfig # CORS, OpenAPI, recovery/timeouts
//! └── service: ServiceConfig       # Chunking, pacing, vendor credentials
//! ```
//!
//! Every option can be given as a CLI argument or an environment variable.
//!
//! ```bash
//! redraft --port 5000 --chunk-delay-secs 5
//! PORT=5000 OPENAI_API_KEY=sk-... redraft
//! ```

mod middleware;
mod server;

use std::process;

use anyhow::Context;
use clap::Parser;
pub use middleware::MiddlewareConfig;
use redraft_server::service::ServiceConfig;
use serde::{Deserialize, Serialize};
pub use server::ServerConfig;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::{TRACING_TARGET_CONFIG, TRACING_TARGET_SERVER_STARTUP};

/// Complete CLI configuration of the Redraft server.
#[derive(Debug, Clone, Parser, Serialize, Deserialize)]
#[command(name = "redraft")]
#[command(about = "Redraft document rewriting server")]
#[command(version)]
pub struct Cli {
    /// Server network and lifecycle configuration.
    #[clap(flatten)]
    pub server: ServerConfig,

    /// HTTP middleware configuration (CORS, OpenAPI, timeouts).
    #[clap(flatten)]
    pub middleware: MiddlewareConfig,

    /// Chunking, pacing and vendor configuration.
    #[clap(flatten)]
    pub service: ServiceConfig,
}

impl Cli {
    /// Loads the `.env` file (if enabled) and parses CLI arguments.
    ///
    /// The `.env` file is read first so clap picks its values up as
    /// environment defaults.
    pub fn init() -> Self {
        Self::load_dotenv();
        Self::parse()
    }

    #[cfg(feature = "dotenv")]
    fn load_dotenv() {
        if let Err(err) = dotenvy::dotenv()
            && !err.not_found()
        {
            eprintln!("Warning: failed to load .env file: {err}");
        }
    }

    #[cfg(not(feature = "dotenv"))]
    fn load_dotenv() {}

    /// Initializes tracing with `RUST_LOG` filtering, defaulting to `info`.
    pub fn init_tracing() {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    fn log_build_info() {
        tracing::debug!(
            target: TRACING_TARGET_SERVER_STARTUP,
            version = env!("CARGO_PKG_VERSION"),
            pid = process::id(),
            arch = std::env::consts::ARCH,
            os = std::env::consts::OS,
            features = ?Self::enabled_features(),
            "Build information"
        );
    }

    /// Validates all configuration values.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.server
            .validate()
            .context("invalid server configuration")?;
        self.middleware
            .validate()
            .context("invalid middleware configuration")?;
        self.service
            .validate()
            .context("invalid service configuration")?;
        Ok(())
    }

    /// Logs the configuration without credentials.
    pub fn log(&self) {
        Self::log_build_info();
        self.server.log();
        self.middleware.log();

        let providers = &self.service.providers;
        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            openai = providers.openai_api_key.is_some(),
            anthropic = providers.anthropic_api_key.is_some(),
            deepseek = providers.deepseek_api_key.is_some(),
            perplexity = providers.perplexity_api_key.is_some(),
            gptzero = providers.gptzero_api_key.is_some(),
            provider_timeout_secs = providers.provider_timeout_secs,
            transcribe_timeout_secs = providers.transcribe_timeout_secs,
            "Provider configuration"
        );

        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            baseline_words = self.service.chunker.baseline_words,
            max_words = self.service.chunker.max_words,
            scaling = self.service.chunker.scaling,
            chunk_delay_secs = self.service.processor.chunk_delay_secs,
            max_processing_jobs = self.service.max_processing_jobs,
            max_rewrite_jobs = self.service.max_rewrite_jobs,
            "Processing configuration"
        );
    }

    fn enabled_features() -> Vec<&'static str> {
        [cfg!(feature = "dotenv").then_some("dotenv")]
            .into_iter()
            .flatten()
            .collect()
    }
}
