//! Prometheus exporter for participation metrics.
//!
//! This crate provides an Axum HTTP server with a single scrape endpoint,
//! `GET /metrics`, serving the Prometheus text exposition format.
//!
//! # Architecture
//!
//! Every scrape runs one aggregation through the shared
//! [`ParticipationManager`](participation_core::ParticipationManager),
//! projects the resulting [`Snapshot`](participation_core::Snapshot) onto a
//! set of labeled gauges, and encodes the registry. A failed or timed-out
//! aggregation is logged and the previously projected values are served.
//!
//! Besides the participation gauges, the registry optionally carries:
//!
//! - **Runtime metrics**: Tokio worker and alive-task gauges
//! - **Process metrics**: CPU, memory and file descriptors (Linux only)
//! - **Exposition metrics**: scrape request counter and in-flight gauge
//!
//! Each group is switched on or off in [`PrometheusConfig`].

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod router;
pub mod server;
pub mod startup;
pub mod state;

// Re-export primary types for convenience.
pub use config::PrometheusConfig;
pub use error::ExporterError;
pub use metrics::{MetricsExporter, ParticipationMetrics};
pub use router::build_router;
pub use server::{serve, ServerError};
pub use startup::{spawn_exporter, ExporterHandle, StartupError};
pub use state::AppState;
