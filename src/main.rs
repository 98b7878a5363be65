//! Dentacal API Server
//!
//! Run with: cargo run --bin dentacal
//!
//! # Configuration
//!
//! Loaded from `--config <path>`, or from the default locations
//! (`<config dir>/dentacal/config.toml`, `/etc/dentacal/config.toml`,
//! `./config.toml`). Environment variables override the file:
//! - `DENTACAL_DATA_DIR`: Data directory
//! - `DENTACAL_SEED_SOURCE`: Seed file path or URL
//! - `DENTACAL_API_HOST` / `DENTACAL_API_PORT`: Bind address
//! - `DENTACAL_LOG_LEVEL` / `DENTACAL_LOG_FORMAT`: Logging
//! - `RUST_LOG`: Takes precedence over the configured level

use anyhow::Context;
use clap::Parser;
use dentacal::api::{serve, ApiConfig, AppState};
use dentacal::config::{Config, LoggingConfig};
use dentacal::storage::ClinicStore;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "dentacal")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Dental clinic scheduling server")]
struct Args {
    /// Config file (default: search the standard locations)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load_with_env(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => Config::load_default(),
    };

    init_tracing(&config.logging);

    tracing::info!("Starting Dentacal server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Clinic: {}", config.clinic.name);
    tracing::info!("Data directory: {}", config.storage.data_dir);

    let store = ClinicStore::open(config.store_config())
        .await
        .context("opening clinic store")?;
    tracing::info!("Store ready: {}", store.stats().await);

    let api_config = ApiConfig::from(&config);
    let state = AppState::new(Arc::new(store), api_config.clone());

    serve(state, &api_config).await?;

    tracing::info!("Dentacal server stopped");
    Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("dentacal={},tower_http=info", logging.level))
    });

    let registry = tracing_subscriber::registry().with(filter);
    if logging.format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
