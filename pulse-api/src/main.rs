//! pulse-api - Feedback Collection Service
//!
//! Accepts star-rating + review submissions, enriches them with generated
//! insight text (external service with offline fallback), persists them in
//! the configured record store, and serves the full feed newest-first for
//! the submission form and the admin dashboard to poll.

use anyhow::Result;
use clap::Parser;
use pulse_api::insights::InsightGenerator;
use pulse_api::{build_router, store, AppState};
use pulse_common::config::{self, Overrides};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Command-line overrides; anything not given here falls through to
/// environment variables, the TOML config file, then compiled defaults.
#[derive(Debug, Parser)]
#[command(name = "pulse-api", version, about = "Pulse feedback collection service")]
struct Args {
    /// Bind host
    #[arg(long)]
    host: Option<String>,

    /// Bind port
    #[arg(long)]
    port: Option<u16>,

    /// Storage backend: memory, file, or sqlite
    #[arg(long)]
    storage: Option<String>,

    /// Directory holding the snapshot file or database
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Path to a TOML config file
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!(
        "Starting Pulse feedback service (pulse-api) v{}",
        env!("CARGO_PKG_VERSION")
    );

    let args = Args::parse();
    let config = config::load(&Overrides {
        host: args.host,
        port: args.port,
        storage: args.storage,
        data_dir: args.data_dir,
        config_file: args.config,
    })?;

    let store = store::init_store(&config.storage).await?;
    let insights = Arc::new(InsightGenerator::new(&config.insights));

    let state = AppState::new(store, insights);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port)).await?;
    info!("pulse-api listening on http://{}:{}", config.host, config.port);
    info!("Health check: http://{}:{}/health", config.host, config.port);

    axum::serve(listener, app).await?;

    Ok(())
}
