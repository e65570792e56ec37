//! Error types for the node binary.
//!
//! [`NodeError`] wraps every failure mode of node startup so `main` can
//! propagate with `?`.

/// Top-level error for the node binary.
#[derive(Debug, thiserror::Error)]
pub enum NodeError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: crate::config::ConfigError,
    },

    /// The ledger state could not be loaded.
    #[error("ledger error: {source}")]
    Ledger {
        /// The underlying ledger error.
        #[from]
        source: participation_ledger::LedgerError,
    },

    /// The startup aggregation failed.
    #[error("aggregation error: {source}")]
    Aggregate {
        /// The underlying aggregation error.
        #[from]
        source: participation_core::AggregateError,
    },

    /// The Prometheus exporter failed to start.
    #[error("exporter error: {source}")]
    Exporter {
        /// The underlying startup error.
        #[from]
        source: participation_exporter::StartupError,
    },

    /// Waiting for the shutdown signal failed.
    #[error("signal error: {source}")]
    Signal {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },
}
