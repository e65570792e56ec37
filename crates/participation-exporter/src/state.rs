//! Shared application state for the exporter.
//!
//! [`AppState`] bundles the participation manager that scrapes aggregate
//! from with the metrics registry they are projected onto. It is cheap to
//! clone and injected via Axum's `State` extractor.

use std::sync::Arc;
use std::time::Duration;

use participation_core::ParticipationManager;

use crate::config::PrometheusConfig;
use crate::error::ExporterError;
use crate::metrics::MetricsExporter;

/// Shared state for the Axum application.
pub struct AppState<S> {
    /// The manager owning the participation source.
    pub manager: Arc<ParticipationManager<S>>,
    /// The registry and its metric groups.
    pub exporter: Arc<MetricsExporter>,
    /// Upper bound on one aggregation.
    pub collect_timeout: Duration,
}

impl<S> AppState<S> {
    /// Build the state for `manager` with the metric groups enabled in
    /// `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ExporterError`] if the registry cannot be built.
    pub fn new(
        manager: Arc<ParticipationManager<S>>,
        config: &PrometheusConfig,
    ) -> Result<Self, ExporterError> {
        Ok(Self {
            manager,
            exporter: Arc::new(MetricsExporter::new(config)?),
            collect_timeout: config.collect_timeout(),
        })
    }
}

// Manual impl: cloning the state must not require `S: Clone`.
impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            manager: Arc::clone(&self.manager),
            exporter: Arc::clone(&self.exporter),
            collect_timeout: self.collect_timeout,
        }
    }
}
