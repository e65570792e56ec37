//! Exporter startup helper for embedding in the node binary.
//!
//! Provides [`spawn_exporter`] which binds the scrape endpoint and serves
//! it on a background Tokio task. Binding happens before the task is
//! spawned, so an unusable address is reported to the caller directly.
//!
//! # Usage
//!
//! ```rust,ignore
//! use participation_exporter::{spawn_exporter, PrometheusConfig};
//!
//! let handle = spawn_exporter(&PrometheusConfig::default(), manager).await?;
//! // ...
//! handle.shutdown().await;
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use participation_core::{ParticipationManager, ParticipationSource};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::config::PrometheusConfig;
use crate::error::ExporterError;
use crate::server::{serve, ServerError};
use crate::state::AppState;

/// Errors that can occur when spawning the exporter.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    /// The server failed to bind or start.
    #[error("server start error: {0}")]
    Server(#[from] ServerError),

    /// The metrics registry could not be built.
    #[error("metrics registry error: {0}")]
    Registry(#[from] ExporterError),
}

/// A running exporter task.
#[derive(Debug)]
pub struct ExporterHandle {
    local_addr: SocketAddr,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl ExporterHandle {
    /// The address the scrape endpoint is bound to.
    pub const fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop accepting scrapes and wait for the server task to finish.
    pub async fn shutdown(self) {
        // The receiver is gone only if the server already exited.
        let _ = self.shutdown.send(());
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "Prometheus exporter task failed");
        }
    }
}

/// Bind the scrape endpoint and serve it on a background Tokio task.
///
/// # Errors
///
/// Returns [`StartupError`] if the registry cannot be built or the bind
/// address cannot be bound.
pub async fn spawn_exporter<S>(
    config: &PrometheusConfig,
    manager: Arc<ParticipationManager<S>>,
) -> Result<ExporterHandle, StartupError>
where
    S: ParticipationSource + Send + 'static,
{
    let state = AppState::new(manager, config)?;

    let bind_error = |source| ServerError::Bind {
        address: config.bind_address.clone(),
        source,
    };
    let listener = TcpListener::bind(config.bind_address.as_str())
        .await
        .map_err(bind_error)?;
    let local_addr = listener.local_addr().map_err(bind_error)?;

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let task = tokio::spawn(async move {
        let shutdown = async {
            // A dropped sender also stops the server.
            let _ = shutdown_rx.await;
        };
        if let Err(e) = serve(listener, state, shutdown).await {
            tracing::error!(error = %e, "Prometheus exporter exited with error");
        }
    });

    tracing::info!(%local_addr, "Prometheus exporter spawned on background task");
    Ok(ExporterHandle {
        local_addr,
        shutdown: shutdown_tx,
        task,
    })
}
