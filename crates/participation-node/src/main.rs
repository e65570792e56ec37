//! Participation metrics node.
//!
//! Loads a participation ledger from its JSON state document, wraps it in
//! a [`ParticipationManager`], and serves participation metrics on a
//! Prometheus scrape endpoint until interrupted.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `participation-config.yaml`
//! 2. Initialize structured logging (tracing)
//! 3. Restore the participation ledger
//! 4. Run one aggregation to validate the ledger and log a summary
//! 5. Start the Prometheus exporter (when enabled)
//! 6. Wait for `Ctrl-C` and shut the exporter down

mod config;
mod error;

use std::path::PathBuf;
use std::sync::Arc;

use participation_core::ParticipationManager;
use participation_ledger::{LedgerState, ParticipationLedger};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::{LedgerConfig, LoggingConfig, NodeConfig, CONFIG_PATH_ENV, DEFAULT_CONFIG_PATH};
use crate::error::NodeError;

/// Application entry point for the participation node.
///
/// # Errors
///
/// Returns an error if any startup step fails or the shutdown signal
/// cannot be awaited.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration. Logging depends on it, so failures here go to
    //    stderr through the returned error.
    let (config, config_source) = load_config()?;

    // 2. Initialize structured logging.
    init_tracing(&config.logging);
    info!("participation-node starting");
    info!(
        source = %config_source,
        prometheus_enabled = config.prometheus.enabled,
        bind_address = %config.prometheus.bind_address,
        "Configuration loaded"
    );

    // 3. Restore the ledger.
    let ledger = load_ledger(&config.ledger)?;
    let manager = Arc::new(ParticipationManager::new(ledger));

    // 4. Validate with one aggregation.
    let snapshot = manager.aggregate().await.map_err(NodeError::from)?;
    info!(
        milestone_index = snapshot.milestone_index,
        events = snapshot.events.total,
        upcoming = snapshot.events.upcoming,
        commencing = snapshot.events.commencing,
        holding = snapshot.events.holding,
        ended = snapshot.events.ended,
        ballots = snapshot.ballots.len(),
        staking = snapshot.staking.len(),
        "Initial participation snapshot"
    );

    // 5. Start the exporter.
    let exporter = if config.prometheus.enabled {
        let handle = participation_exporter::spawn_exporter(&config.prometheus, manager)
            .await
            .map_err(NodeError::from)?;
        info!(addr = %handle.local_addr(), "Prometheus exporter started");
        Some(handle)
    } else {
        info!("Prometheus exporter disabled");
        None
    };

    // 6. Run until interrupted.
    tokio::signal::ctrl_c().await.map_err(NodeError::from)?;
    info!("Shutdown signal received");

    if let Some(handle) = exporter {
        handle.shutdown().await;
    }

    info!("participation-node stopped");
    Ok(())
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured level.
fn init_tracing(logging: &LoggingConfig) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level)),
        )
        .with_target(true)
        .init();
}

/// Load configuration from `PARTICIPATION_CONFIG` or
/// `participation-config.yaml`.
///
/// A missing default file falls back to built-in defaults; a missing file
/// named explicitly is an error. Returns the config and a description of
/// where it came from.
fn load_config() -> Result<(NodeConfig, String), NodeError> {
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(path);
        let config = NodeConfig::from_file(&path)?;
        return Ok((config, path.display().to_string()));
    }

    let path = PathBuf::from(DEFAULT_CONFIG_PATH);
    if path.exists() {
        let config = NodeConfig::from_file(&path)?;
        Ok((config, path.display().to_string()))
    } else {
        let mut config = NodeConfig::default();
        config.apply_env_overrides()?;
        Ok((config, String::from("defaults")))
    }
}

/// Restore the ledger from its state file, or start empty.
fn load_ledger(config: &LedgerConfig) -> Result<ParticipationLedger, NodeError> {
    let Some(path) = &config.state_file else {
        warn!("No ledger state file configured, starting with an empty ledger");
        return Ok(ParticipationLedger::new(0));
    };

    info!(path = %path.display(), "Loading ledger state");
    let state = LedgerState::from_file(path)?;
    Ok(ParticipationLedger::from_state(state)?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::path::Path;

    use super::*;

    #[test]
    fn missing_state_file_starts_empty() {
        let ledger = load_ledger(&LedgerConfig::default()).unwrap();
        assert_eq!(ledger.ledger_index(), 0);
        assert!(ledger.events().is_empty());
    }

    #[tokio::test]
    async fn demo_state_loads_and_aggregates() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../demos/ledger-state.json");
        let ledger = load_ledger(&LedgerConfig {
            state_file: Some(path),
        })
        .unwrap();

        let snapshot = ParticipationManager::new(ledger).aggregate().await.unwrap();
        assert_eq!(snapshot.milestone_index, 25);
        assert_eq!(snapshot.events.total, 3);
        assert_eq!(snapshot.ballots.len(), 1);
        assert_eq!(snapshot.staking.len(), 1);
    }

    #[test]
    fn unreadable_state_file_is_an_error() {
        let result = load_ledger(&LedgerConfig {
            state_file: Some(PathBuf::from("/nonexistent/ledger-state.json")),
        });
        assert!(matches!(result, Err(NodeError::Ledger { .. })));
    }
}
