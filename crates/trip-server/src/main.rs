//! Booking server binary.

use anyhow::Result;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use trip_server::config::Config;
use trip_server::server;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env()?;
    info!(bind = %config.bind_addr, port = config.port, "starting trip-server");

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "cannot listen for ctrl-c; stopping");
        }
    };

    server::run(config, shutdown).await?;
    Ok(())
}
