//! Standalone REST API server binary.
//!
//! ## Purpose
//! Runs the REST API server on its own, without reading a `.env` file.
//!
//! ## Intended use
//! Useful for development and containers where the environment is set explicitly. The
//! workspace's main `pms-run` binary also loads `.env` before serving.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pms_core::{data_file_from_env_value, CoreConfig};

/// Main entry point for the PMS REST API server
///
/// # Environment Variables
/// - `PMS_REST_ADDR`: Server address (default: "0.0.0.0:3000")
/// - `PMS_DATA_FILE`: Patient store file (default: "patients.json")
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the store path is invalid,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_rest=info".parse()?)
                .add_directive("pms_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("PMS_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let data_file = data_file_from_env_value(std::env::var("PMS_DATA_FILE").ok());
    let cfg = CoreConfig::new(data_file)?;

    tracing::info!("-- Starting PMS REST API on {}", addr);

    api_rest::serve(&addr, &cfg).await
}
