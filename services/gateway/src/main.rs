mod auth;
mod config;
mod error;
mod extract;
mod handlers;
mod models;
mod rate_limit;
mod router;
mod state;

use anyhow::Context;
use config::GatewayConfig;
use records::JournalRecordStore;
use router::create_router;
use state::AppState;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = GatewayConfig::from_env()?;
    tracing::info!(
        data_dir = %config.data_dir.display(),
        max_wait_secs = config.max_wait.map(|d| d.as_secs()),
        rate_limit_per_min = config.rate_limit_per_min,
        "Starting evaluation gateway"
    );

    let store = JournalRecordStore::open(&config.data_dir)
        .with_context(|| format!("opening record journal in {}", config.data_dir.display()))?;

    let addr = config.listen_addr;
    let state = AppState::new(config, Arc::new(store));
    let app = create_router(state);

    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
