//! Waitlist API server.
//!
//! Subscription signup, analytics ingestion and health probes for the
//! course landing page, backed by SQLite.
//!
//! # Architecture Overview
//!
//! ```text
//!                           ┌──────────────────────────────────────────────────────┐
//!                           │                     WAITLIST API                     │
//!                           │                                                      │
//!     POST /api/subscribe   │  ┌──────────┐    ┌────────────┐    ┌─────────────┐   │
//!     ──────────────────────┼─▶│   rate   │───▶│ validation │───▶│ subscriber  │   │
//!                           │  │ limiter  │    │            │    │   upsert    │   │
//!                           │  └──────────┘    └────────────┘    └──────┬──────┘   │
//!                           │                                          │           │
//!     POST /api/analytics   │  ┌──────────┐    ┌────────────┐          ▼           │
//!     ──────────────────────┼─▶│  event   │───▶│  dispatch  │───▶┌─────────────┐   │
//!                           │  │  parse   │    │  per kind  │    │    store    │   │
//!                           │  └──────────┘    └────────────┘    │  (SQLite)   │   │
//!                           │                                    └─────────────┘   │
//!     GET /health/db        │  ┌──────────┐                           ▲            │
//!     ──────────────────────┼─▶│  probe   │───────────────────────────┘            │
//!                           │  └──────────┘                                        │
//!                           │                                                      │
//!                           │  ┌────────────────────────────────────────────────┐  │
//!                           │  │              Cross-Cutting Concerns            │  │
//!                           │  │  ┌────────┐ ┌─────────────┐ ┌───────────────┐  │  │
//!                           │  │  │ config │ │observability│ │   lifecycle   │  │  │
//!                           │  │  │+reload │ │logs/metrics │ │signals/drain  │  │  │
//!                           │  │  └────────┘ └─────────────┘ └───────────────┘  │  │
//!                           │  └────────────────────────────────────────────────┘  │
//!                           └──────────────────────────────────────────────────────┘
//! ```
//!
//! # Endpoints
//!
//! - `POST /api/subscribe`: rate-limited signup with upsert semantics
//! - `GET /api/subscribe`: active subscriber count
//! - `POST /api/analytics`: typed event ingestion, best effort
//! - `POST/GET /api/analytics/page-view`: page view beacon and stats
//! - `GET/HEAD /health/db`: database health probe
//! - `/admin/*`: operator endpoints behind a bearer token, optional

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use waitlist_api::config::loader::load_config;
use waitlist_api::config::watcher::ConfigWatcher;
use waitlist_api::lifecycle::{wait_for_signal, Shutdown};
use waitlist_api::{ApiConfig, HttpServer, Store};

#[derive(Parser)]
#[command(name = "waitlist-api")]
#[command(about = "Subscription and analytics backend", long_about = None)]
struct Args {
    /// TOML configuration file. Built-in defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => ApiConfig::default(),
    };

    // RUST_LOG wins over the configured filter.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.observability.log_filter.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("waitlist-api v{} starting", env!("CARGO_PKG_VERSION"));
    if args.config.is_none() {
        tracing::info!("No configuration file given, using defaults");
    }

    tracing::info!(
        bind_address = %config.listener.bind_address,
        database = %config.database.path,
        environment = config.environment.as_str(),
        rate_limit = config.rate_limit.limit,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => waitlist_api::observability::metrics::init_metrics(addr),
            Err(_) => {
                tracing::error!(
                    metrics_address = %config.observability.metrics_address,
                    "Failed to parse metrics address"
                );
            }
        }
    }

    let store = Store::open(&config.database.path, config.database.max_connections).await?;
    tracing::info!(path = %config.database.path, "Database ready");

    // Hot reload only runs when the config came from a file; with
    // defaults the update channel simply stays idle.
    let (_idle_tx, mut config_updates) = tokio::sync::mpsc::unbounded_channel();
    let mut _watcher = None;
    if let Some(path) = &args.config {
        let (watcher, updates) = ConfigWatcher::new(path);
        config_updates = updates;
        _watcher = Some(watcher.run()?);
        tracing::info!(config = %path.display(), "Watching configuration file for changes");
    }

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        wait_for_signal().await;
        tracing::info!(tasks = shutdown.receiver_count(), "Signaling tasks to stop");
        shutdown.trigger();
        wait_for_signal().await;
        tracing::warn!("Second signal received, exiting immediately");
        std::process::exit(1);
    });

    let listener = TcpListener::bind(&config.listener.bind_address).await?;

    let server = HttpServer::new(config, store.clone());
    server
        .run(listener, config_updates, server_shutdown)
        .await?;

    store.close().await;
    tracing::info!("Shutdown complete");
    Ok(())
}
