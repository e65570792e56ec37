//! Exporter HTTP server lifecycle.
//!
//! Provides [`serve`] which runs the Axum server on an already bound
//! listener until the shutdown future resolves.

use std::future::Future;

use participation_core::ParticipationSource;
use tokio::net::TcpListener;
use tracing::info;

use crate::router::build_router;
use crate::state::AppState;

/// Serve the scrape endpoint on `listener` until `shutdown` resolves.
///
/// # Errors
///
/// Returns [`ServerError::Serve`] if the server hits a fatal I/O error.
pub async fn serve<S, F>(
    listener: TcpListener,
    state: AppState<S>,
    shutdown: F,
) -> Result<(), ServerError>
where
    S: ParticipationSource + Send + 'static,
    F: Future<Output = ()> + Send + 'static,
{
    let router = build_router(state);

    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "Prometheus exporter listening");
    }

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(ServerError::Serve)?;

    info!("Prometheus exporter stopped");
    Ok(())
}

/// Errors that can occur when starting or running the exporter server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Failed to bind to the network address.
    #[error("bind error on {address}: {source}")]
    Bind {
        /// The configured bind address.
        address: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The server encountered a fatal error while serving.
    #[error("serve error: {0}")]
    Serve(#[source] std::io::Error),
}
