mod bot;
mod config;
mod platform;
mod polling;
mod router;
mod server;
mod webhook;

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,clinicbot=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Optional config file; environment variables override it
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    info!("Loading configuration from: {}", config_path.display());
    // Refuse to start without a token, before anything is bound.
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))
        .inspect_err(|e| error!("{:#}", e))?;

    info!("Configuration loaded successfully");
    info!("  Mode: {}", config.mode());
    info!("  Listen: {}:{}", config.server.host, config.server.port);
    if let Some(base_url) = &config.webhook.base_url {
        info!("  Webhook base URL: {}", base_url);
    }

    bot::run(config).await?;

    Ok(())
}
