use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pms_core::{data_file_from_env_value, CoreConfig};

/// Main entry point for the PMS application
///
/// Loads `.env` if present, configures logging, resolves configuration once and serves the
/// REST API.
///
/// # Environment Variables
/// - `PMS_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `PMS_DATA_FILE`: Patient store file (default: "patients.json")
/// - `RUST_LOG`: Extra tracing directives
///
/// # Returns
/// * `Ok(())` - If the server starts and runs successfully
/// * `Err(anyhow::Error)` - If configuration, startup or the server fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("pms_run=info".parse()?)
                .add_directive("api_rest=info".parse()?)
                .add_directive("pms_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("PMS_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let data_file = data_file_from_env_value(std::env::var("PMS_DATA_FILE").ok());
    let cfg = CoreConfig::new(data_file)?;

    tracing::info!("++ Starting PMS REST on {}", rest_addr);

    api_rest::serve(&rest_addr, &cfg).await
}
