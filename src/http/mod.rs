//! HTTP API server.
//!
//! Exposes the clip pipeline and the collaborator features over JSON.
//! Shutdown (SIGINT, SIGTERM) cancels in-flight runs, which then clean up
//! like any other failure.

pub mod error;
pub mod handlers;
pub mod request_id;
pub mod router;
pub mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::app::{workspace, AppContainer};
use crate::config::ServiceConfig;
use crate::error::{YtClipError, YtClipResult};

pub use error::AppError;
pub use router::build_router;
pub use state::AppState;

/// Bind, serve until a shutdown signal arrives, then drop leftover artifacts.
pub async fn serve(config: &ServiceConfig, container: Arc<dyn AppContainer>) -> YtClipResult<()> {
    let addr: SocketAddr = config
        .server
        .bind
        .parse()
        .map_err(|e| YtClipError::InvalidConfig {
            message: format!("Invalid server address {}: {}", config.server.bind, e),
        })?;

    let ttl = config.pipeline.artifact_ttl();
    let stale = workspace::sweep_stale(&config.pipeline.temp_dir, ttl);
    if stale > 0 {
        tracing::info!(removed = stale, "removed stale run directories");
    }
    let stale = workspace::sweep_stale_outputs(&config.pipeline.output_dir, ttl);
    if stale > 0 {
        tracing::info!(removed = stale, "removed uncollected outputs");
    }

    let shutdown = CancellationToken::new();
    let artifacts = container.artifacts();
    let sweeper = Arc::clone(&artifacts).spawn_sweeper(shutdown.clone());

    let app = build_router(AppState::new(container, shutdown.clone()));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Starting server on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
        .await?;

    shutdown.cancel();
    if let Err(e) = sweeper.await {
        tracing::warn!(error = %e, "artifact sweeper ended abnormally");
    }
    let purged = artifacts.purge().await;
    tracing::info!(purged, "Server shutdown complete");
    Ok(())
}

/// Wait for SIGINT or SIGTERM (or an external cancel), then cancel `shutdown`.
async fn shutdown_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
        _ = shutdown.cancelled() => {}
    }

    tracing::info!("Shutdown signal received");
    shutdown.cancel();
}
