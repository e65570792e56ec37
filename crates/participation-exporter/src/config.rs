//! Exporter configuration.
//!
//! Deserialized from the `prometheus` section of the node configuration
//! file. Every field has a default, so an empty section is valid.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for the Prometheus scrape endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrometheusConfig {
    /// Whether the exporter is started at all.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Address the scrape endpoint binds to, as `host:port`.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Include the participation event, ballot and staking gauges.
    #[serde(default = "default_true")]
    pub participation_metrics: bool,

    /// Include Tokio runtime gauges.
    #[serde(default)]
    pub runtime_metrics: bool,

    /// Include process metrics (Linux only).
    #[serde(default)]
    pub process_metrics: bool,

    /// Include metrics about the scrape endpoint itself.
    #[serde(default)]
    pub exposition_metrics: bool,

    /// Upper bound on one aggregation, in milliseconds.
    #[serde(default = "default_collect_timeout_ms")]
    pub collect_timeout_ms: u64,
}

impl PrometheusConfig {
    /// The aggregation timeout as a [`Duration`].
    pub const fn collect_timeout(&self) -> Duration {
        Duration::from_millis(self.collect_timeout_ms)
    }
}

impl Default for PrometheusConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind_address: default_bind_address(),
            participation_metrics: true,
            runtime_metrics: false,
            process_metrics: false,
            exposition_metrics: false,
            collect_timeout_ms: default_collect_timeout_ms(),
        }
    }
}

const fn default_true() -> bool {
    true
}

fn default_bind_address() -> String {
    String::from("0.0.0.0:9312")
}

const fn default_collect_timeout_ms() -> u64 {
    5_000
}
