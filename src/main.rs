//! Long-running request service.
//!
//! # Architecture Overview
//!
//! ```text
//!   Client ──▶ request id ──▶ trace span ──▶ timeout ──▶ cancellation boundary ──▶ handler
//!                                                               │                    │
//!                                         child token per request, dropped           ▼
//!                                         with the connection or on shutdown   task sequencer
//!                                                               │                    │
//!   Client ◀──────────────── 200 JSON / 400 / 499 ◀─────────────┴────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use long_task_cancellation::config::{load_config, ServiceConfig};
use long_task_cancellation::lifecycle::{signals, Shutdown};
use long_task_cancellation::observability::{logging, metrics};
use long_task_cancellation::HttpServer;

#[derive(Parser)]
#[command(name = "long-task-cancellation")]
#[command(about = "HTTP service demonstrating cooperative request cancellation", long_about = None)]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => ServiceConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
    }

    logging::init_logging(&config.observability);
    tracing::info!("long-task-cancellation v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        default_delays_ms = ?config.sequencer.default_delays_ms,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    signals::spawn_signal_handler(shutdown.clone());

    HttpServer::new(&config, shutdown).run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
