//! Caption bridge server.
//!
//! # Architecture Overview
//!
//! ```text
//!  presentation app                 ┌──────────────────────────────┐
//!  status API  ◀── GET /status ────│  poller  (change detection,  │
//!                                  │           connectivity edges)│
//!                                  └──────┬───────────────────────┘
//!                                         │ text_update
//!                                         ▼
//!  editor ── /api/config ──▶ store ──▶  hub  ──▶ display clients
//!            (merge, persist,  config   │ fan-out      (WebSocket)
//!             broadcast)                │ catch-up push on join
//!                                       ▼
//!  anyone ── /api/status ──▶ read-only projection
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use caption_bridge::config::loader::load_config;
use caption_bridge::config::BridgeConfig;
use caption_bridge::http::{AppState, BridgeServer};
use caption_bridge::observability;
use caption_bridge::poller::StatusPoller;

#[derive(Parser)]
#[command(name = "caption-bridge")]
#[command(about = "Bridges a presentation status API to live caption displays", long_about = None)]
struct Cli {
    /// Path to the server configuration file (TOML). Defaults apply
    /// when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => BridgeConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    // Initialize tracing subscriber
    let default_filter = format!(
        "caption_bridge={},tower_http=warn",
        config.observability.log_level
    );
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("caption-bridge v{} starting", env!("CARGO_PKG_VERSION"));

    let state = AppState::from_config(&config);

    tracing::info!(
        bind_address = %config.listener.bind_address,
        store_path = %config.store.path,
        external_api = %state.store.current().external_api,
        poll_interval_ms = config.poller.interval_ms,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            observability::metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    // Spawn the status poller; it runs for the process lifetime.
    let poller = StatusPoller::new(
        config.poller.clone(),
        state.store.clone(),
        state.caption.clone(),
        state.hub.clone(),
        state.connectivity.clone(),
    )?;
    tokio::spawn(poller.run());

    // Bind failure is the only fatal error in this system.
    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let server = BridgeServer::new(&config, state);
    server.run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
