//! Jobs API server.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──▶ request id ──▶ rate limit ──▶ security headers ──▶ CORS
//!         ──▶ sanitize ──▶ router ──┬─▶ root / docs
//!                                   ├─▶ auth handlers
//!                                   └─▶ auth guard ──▶ jobs handlers ──▶ storage
//!     Client Response
//!     ◀── error envelope guard ◀── ... (every failure is `{message, statusCode}`)
//! ```
//!
//! Startup connects storage first; the listener is bound only on success.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use jobs_api::config::load_config;
use jobs_api::lifecycle::{signals, Lifecycle, Shutdown};
use jobs_api::observability::{logging, metrics};
use jobs_api::storage::MemoryConnector;

#[derive(Parser)]
#[command(name = "jobs-api")]
#[command(about = "Jobs tracking HTTP API", long_about = None)]
struct Cli {
    /// Optional TOML config file. Environment variables override it.
    #[arg(short, long, env = "JOBS_API_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("jobs-api: {e}");
            return ExitCode::FAILURE;
        }
    };

    logging::init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "jobs-api starting");

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let shutdown = Shutdown::new();
    signals::spawn_signal_handler(shutdown.clone());

    let lifecycle = Lifecycle::new(config);
    match lifecycle.run(&MemoryConnector, shutdown.subscribe()).await {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(_) => ExitCode::FAILURE,
    }
}
