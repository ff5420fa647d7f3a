//! NEAR validator watcher binary.
//!
//! This binary runs the `watcher` refresh loop against a NEAR RPC node and
//! exposes a small HTTP API:
//!
//! - `GET /metrics` (Prometheus text format)
//! - `GET /live`
//! - `GET /ready` (200 once the node reports it is not syncing)
//!
//! Ctrl-C or SIGTERM stops the refresh loop and drains the HTTP server.

mod config;
mod routes;
mod state;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use config::Args;
use state::{AppState, SharedState};
use watcher::{RpcClient, Watcher};

#[tokio::main]
async fn main() {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)),
        )
        .init();

    if let Err(e) = run(args).await {
        eprintln!("fatal error: {e:#}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let rpc_cfg = args.rpc_config();
    rpc_cfg.validate()?;
    let watcher_cfg = args.watcher_config();

    // ---------------------------
    // RPC client + watcher
    // ---------------------------

    tracing::info!(node = %rpc_cfg.endpoint, "connecting to node");
    let client = RpcClient::new(&rpc_cfg).context("failed to create RPC client")?;

    let watcher = Arc::new(
        Watcher::with_registry(client, watcher_cfg).context("failed to initialise watcher")?,
    );

    let cancel = CancellationToken::new();

    let watcher_task = tokio::spawn({
        let watcher = watcher.clone();
        let cancel = cancel.clone();
        async move { watcher.start(cancel).await }
    });

    // ---------------------------
    // HTTP router
    // ---------------------------

    let app_state: SharedState = Arc::new(AppState::new(
        watcher.metrics().clone(),
        watcher.clone(),
    ));
    let app = routes::router(app_state);

    tracing::info!("HTTP server listening on http://{}", args.http_addr);

    let listener = tokio::net::TcpListener::bind(args.http_addr)
        .await
        .with_context(|| format!("failed to bind {}", args.http_addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cancel.clone()))
        .await
        .context("HTTP server error")?;

    cancel.cancel();
    watcher_task
        .await
        .context("watcher task panicked")?
        .context("watcher failed")?;

    tracing::info!("shut down");
    Ok(())
}

/// Waits for Ctrl-C or SIGTERM, then cancels `cancel`.
async fn shutdown_signal(cancel: CancellationToken) {
    let ctrl_c = async {
        let _ = signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
        _ = cancel.cancelled() => {}
    }

    tracing::info!("shutdown signal received");
    cancel.cancel();
}
