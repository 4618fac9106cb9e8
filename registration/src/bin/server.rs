//! Registration service HTTP server.
//!
//! # Usage
//!
//! ```bash
//! # In-memory store
//! cargo run --bin server
//!
//! # PostgreSQL store
//! STORAGE_BACKEND=postgres DATABASE_URL=postgres://localhost/eventreg cargo run --bin server
//! ```

use metrics_exporter_prometheus::PrometheusBuilder;
use registration::{AppState, Config, EventRegApp, build_router, register_business_metrics};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::signal;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    let _ = dotenvy::dotenv();

    let config = Config::from_env();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.server.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting registration server");
    info!(
        backend = ?config.storage.backend,
        address = %config.bind_address(),
        metrics_port = config.server.metrics_port,
        "Configuration loaded"
    );

    // Prometheus exporter
    let metrics_addr = SocketAddr::from(([0, 0, 0, 0], config.server.metrics_port));
    PrometheusBuilder::new().with_http_listener(metrics_addr).install()?;
    register_business_metrics();
    info!(address = %metrics_addr, "Prometheus metrics available at /metrics");

    let shutdown_timeout = Duration::from_secs(config.server.shutdown_timeout);
    let addr = config.bind_address();

    let app = EventRegApp::new(config).await?;
    info!("Application initialized");

    let router = build_router(AppState::new(app));
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(address = %addr, "Server listening");

    let (stopping_tx, stopping_rx) = watch::channel(false);
    let server = axum::serve(listener, router).with_graceful_shutdown(async move {
        shutdown_signal().await;
        let _ = stopping_tx.send(true);
    });
    let mut server = std::pin::pin!(server.into_future());

    tokio::select! {
        result = &mut server => result?,
        () = drain_deadline(stopping_rx, shutdown_timeout) => {
            warn!(?shutdown_timeout, "Connections still open after shutdown timeout; exiting");
        }
    }

    info!("Server stopped");
    Ok(())
}

/// Completes `timeout` after shutdown begins; pending until then.
async fn drain_deadline(mut stopping: watch::Receiver<bool>, timeout: Duration) {
    if stopping.wait_for(|stopping| *stopping).await.is_err() {
        std::future::pending::<()>().await;
    }
    tokio::time::sleep(timeout).await;
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            warn!(%error, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(error) => {
                warn!(%error, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C signal, shutting down gracefully...");
        },
        () = terminate => {
            info!("Received SIGTERM signal, shutting down gracefully...");
        },
    }
}
