mod generate;
mod health;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use proposal_core::config::{AppConfig, LoadOptions};

use crate::generate::GenerateState;
use crate::health::HealthState;

fn init_logging(config: &AppConfig) {
    use proposal_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    let config = Arc::new(AppConfig::load(LoadOptions::default())?);
    init_logging(&config);

    let app = Router::new()
        .merge(generate::router(GenerateState::new(Arc::clone(&config))))
        .merge(health::router(HealthState::new(Arc::clone(&config))));

    let address = format!("{}:{}", config.server.bind_address, config.server.port);
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind `{address}`"))?;

    tracing::info!(
        event_name = "system.server.started",
        bind_address = %address,
        backend = config.content.backend.as_str(),
        "proposal-server listening"
    );
    axum::serve(listener, app).with_graceful_shutdown(wait_for_shutdown()).await?;
    tracing::info!(event_name = "system.server.stopping", "proposal-server stopping");

    Ok(())
}

async fn wait_for_shutdown() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(
            event_name = "system.server.signal_error",
            error = %error,
            "failed to listen for shutdown signal"
        );
    }
}
