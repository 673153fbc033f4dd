//! HTTP gateway for the SMS relay.
//!
//! Accepts transactions over a small JSON API and runs the collector that
//! delivers them, both in one process.

mod config;
mod error;
mod routes;
mod state;

use collector::{Collector, TacticSelector};
use database::Database;
use providers::{build_provider, http_client};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = Config::from_env()?;
    info!(addr = %config.addr, "Starting gateway");

    // Connect to database
    let db = Database::connect(&config.database_url).await?;
    db.migrate().await?;

    // Build providers
    let http = http_client(&config.providers)?;
    let primary = build_provider(config.primary, &config.providers, &http)?;
    let mut selector = TacticSelector::new(primary);
    if let Some(kind) = config.secondary {
        selector = selector.with_secondary(build_provider(kind, &config.providers, &http)?);
    } else {
        warn!("No SECONDARY_PROVIDER configured, fallback tactic has a single provider");
    }

    // Start collector
    let collector = Collector::new(db.clone(), selector, config.collector.clone());
    let (stop_tx, stop_rx) = tokio::sync::watch::channel(false);
    let collector_task = tokio::spawn(collector.run_with_shutdown(async move {
        let mut stop_rx = stop_rx;
        let _ = stop_rx.wait_for(|stopped| *stopped).await;
    }));

    // Build router
    let app = routes::app(AppState::new(db.clone()), &config.static_dir);

    // Start server
    info!(addr = %config.addr, static_dir = %config.static_dir.display(), "Gateway listening");
    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Stop collector after the server stops accepting requests
    let _ = stop_tx.send(true);
    if let Err(e) = collector_task.await {
        warn!("Collector task failed: {}", e);
    }

    db.close().await;
    info!("Gateway stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
