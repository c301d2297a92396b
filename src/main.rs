//! scrawld - relay daemon for the scrawl shared-canvas application.

use scrawld::config::Config;
use scrawld::network::Gateway;
use scrawld::state::Registry;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());

    let config = Config::load_or_default(&config_path).map_err(|e| {
        error!(path = %config_path, error = %e, "Failed to load config");
        e
    })?;

    info!(
        address = %config.listen.address,
        tls = config.tls.is_some(),
        "Starting scrawld"
    );

    let registry = Arc::new(Registry::new());

    let gateway = Gateway::bind(
        config.listen.address,
        config.tls.clone(),
        Arc::clone(&registry),
    )
    .await?;

    tokio::select! {
        result = gateway.run() => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
            registry.shutdown();
            // Give the writer tasks a moment to flush the shutdown notices;
            // delivery stays best-effort either way.
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }

    Ok(())
}
