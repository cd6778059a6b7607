//! Chaos Proxy
//!
//! A reverse proxy that sits between clients and one target service and
//! injects delays, error responses and timeouts according to a runtime
//! adjustable configuration.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request           ┌──────────────────────────────────────────────┐
//!     ─────────────────────────┼─▶ http server ──▶ /_chaos/* ──▶ admin        │
//!                              │        │                                     │
//!                              │        ▼                                     │
//!                              │   chaos engine ──▶ timeout / error response  │
//!                              │        │                                     │
//!                              │        ▼  (optional delay)                   │
//!     Client Response          │    forwarder ────────────────────────────────┼──── Target
//!     ◀────────────────────────┼── X-Chaos-* markers                          │     Service
//!                              │                                              │
//!                              │  config (flags, file, watcher)  lifecycle    │
//!                              │  observability (logs, metrics)               │
//!                              └──────────────────────────────────────────────┘
//! ```

use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use chaos_proxy::chaos::ChaosEngine;
use chaos_proxy::config::args::ProxyArgs;
use chaos_proxy::config::watcher::ConfigWatcher;
use chaos_proxy::http::HttpServer;
use chaos_proxy::lifecycle::{signals, startup, Shutdown};
use chaos_proxy::observability::{logging, metrics};
use clap::Parser;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = ProxyArgs::parse();
    logging::init_logging(args.log_format);

    tracing::info!("chaos-proxy v{} starting", env!("CARGO_PKG_VERSION"));

    let startup = match startup::prepare(&args) {
        Ok(startup) => startup,
        Err(e) => {
            tracing::error!(error = %e, "Startup failed");
            return Err(e.into());
        }
    };

    if let Some(addr) = startup.observability.metrics_address {
        if let Err(e) = metrics::init_metrics(addr) {
            tracing::error!(error = %e, "Failed to install metrics exporter");
        }
    }

    let engine = Arc::new(ChaosEngine::new(startup.chaos));

    // The watcher handle must outlive the server.
    let (_watcher, config_updates) = match (&startup.overlay.path, startup.overlay.watch) {
        (Some(path), true) => {
            let (watcher, rx) = ConfigWatcher::new(path);
            match watcher.run() {
                Ok(handle) => (Some(handle), rx),
                Err(e) => {
                    tracing::error!(error = %e, "Failed to watch config file");
                    (None, rx)
                }
            }
        }
        _ => {
            let (_tx, rx) = mpsc::unbounded_channel();
            (None, rx)
        }
    };

    let listener = TcpListener::bind(startup.listener.bind_address).await?;
    let local_addr = listener.local_addr()?;

    tracing::info!(
        address = %local_addr,
        target = %startup.target,
        "Chaos proxy listening"
    );
    tracing::info!(
        config = %format!("http://{}/_chaos/config", local_addr),
        stats = %format!("http://{}/_chaos/stats", local_addr),
        health = %format!("http://{}/_chaos/health", local_addr),
        "Management endpoints"
    );

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        signals::wait_for_signal().await;
        shutdown.trigger();
    });

    let server = HttpServer::new(engine, startup.target, startup.listener);
    server.run(listener, config_updates, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
