//! escan-bt (Batch Tracker) - Main entry point
//!
//! HTTP service tracking envelope-scanning batches: batch lifecycle,
//! per-item verdict computation, listing, and spreadsheet import/export.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use escan_bt::{build_router, AppState};
use escan_common::config::ServiceConfig;
use escan_common::db::init_database;

/// Command-line arguments for escan-bt
#[derive(Parser, Debug)]
#[command(name = "escan-bt")]
#[command(about = "Batch Tracker microservice for ESCAN")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "5760", env = "ESCAN_BT_PORT")]
    port: u16,

    /// SQLite database path (defaults to config file, then the OS data dir)
    #[arg(short, long, env = "ESCAN_DATABASE")]
    database: Option<PathBuf>,
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

    // Log build identification immediately after tracing init
    info!(
        "Starting ESCAN Batch Tracker (escan-bt) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let args = Args::parse();
    let config = ServiceConfig::resolve(args.database, args.port);
    info!("Database path: {}", config.database_path.display());

    let pool = init_database(&config.database_path)
        .await
        .context("Failed to initialize database")?;

    let state = AppState::new(pool);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(("127.0.0.1", config.port))
        .await
        .with_context(|| format!("Failed to bind port {}", config.port))?;
    info!("escan-bt listening on http://127.0.0.1:{}", config.port);
    info!("Health check: http://127.0.0.1:{}/health", config.port);

    axum::serve(listener, app).await?;

    Ok(())
}
