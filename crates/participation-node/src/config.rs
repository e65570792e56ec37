//! Node configuration.
//!
//! The configuration lives in `participation-config.yaml`. Every section
//! and field has a default, so a missing file or an empty document yields a
//! working node. A handful of environment variables override the file.
//!
//! | Variable | Overrides |
//! |----------|-----------|
//! | `PROMETHEUS_ENABLED` | `prometheus.enabled` |
//! | `PROMETHEUS_BIND_ADDRESS` | `prometheus.bind_address` |
//! | `LEDGER_STATE_FILE` | `ledger.state_file` |

use std::path::{Path, PathBuf};

use participation_exporter::PrometheusConfig;
use serde::Deserialize;

/// Default location of the configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "participation-config.yaml";

/// Environment variable naming an alternative configuration file.
pub const CONFIG_PATH_ENV: &str = "PARTICIPATION_CONFIG";

/// Errors that can occur when loading the configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config file {path}: {source}")]
    Io {
        /// The file that was read.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid YAML for [`NodeConfig`].
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML error.
        #[from]
        source: serde_yml::Error,
    },

    /// An environment override could not be parsed.
    #[error("invalid value {value:?} for {name}")]
    InvalidOverride {
        /// The environment variable.
        name: &'static str,
        /// Its value.
        value: String,
    },
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NodeConfig {
    /// Prometheus exporter settings.
    #[serde(default)]
    pub prometheus: PrometheusConfig,

    /// Where the participation ledger is loaded from.
    #[serde(default)]
    pub ledger: LedgerConfig,

    /// Log output settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl NodeConfig {
    /// Load the configuration from a YAML file and apply environment
    /// overrides.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::parse(&contents)?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Parse a YAML document without applying overrides.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yml::from_str(yaml)?)
    }

    /// Apply overrides from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides from `lookup`, which maps a variable name to its
    /// value if set.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(value) = lookup("PROMETHEUS_ENABLED") {
            self.prometheus.enabled = parse_bool(&value).ok_or(ConfigError::InvalidOverride {
                name: "PROMETHEUS_ENABLED",
                value,
            })?;
        }
        if let Some(value) = lookup("PROMETHEUS_BIND_ADDRESS") {
            self.prometheus.bind_address = value;
        }
        if let Some(value) = lookup("LEDGER_STATE_FILE") {
            self.ledger.state_file = Some(PathBuf::from(value));
        }
        Ok(())
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Ledger source settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LedgerConfig {
    /// JSON ledger state document. The node starts with an empty ledger
    /// when unset.
    #[serde(default)]
    pub state_file: Option<PathBuf>,
}

/// Log output settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Default `tracing` filter, used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    String::from("info")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: BTreeMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn empty_document_uses_defaults() {
        let config = NodeConfig::parse("{}").unwrap();
        assert_eq!(config, NodeConfig::default());
        assert!(config.prometheus.enabled);
        assert_eq!(config.prometheus.bind_address, "0.0.0.0:9312");
        assert_eq!(config.logging.level, "info");
        assert!(config.ledger.state_file.is_none());
    }

    #[test]
    fn shipped_config_parses() {
        let config = NodeConfig::parse(include_str!("../../../participation-config.yaml")).unwrap();
        assert!(config.prometheus.participation_metrics);
        assert_eq!(
            config.ledger.state_file.as_deref(),
            Some(Path::new("demos/ledger-state.json"))
        );
    }

    #[test]
    fn env_overrides_file_values() {
        let mut config = NodeConfig::parse("prometheus:\n  enabled: true\n").unwrap();
        config
            .apply_overrides(env(&[
                ("PROMETHEUS_ENABLED", "false"),
                ("PROMETHEUS_BIND_ADDRESS", "127.0.0.1:9000"),
                ("LEDGER_STATE_FILE", "/var/lib/ledger.json"),
            ]))
            .unwrap();

        assert!(!config.prometheus.enabled);
        assert_eq!(config.prometheus.bind_address, "127.0.0.1:9000");
        assert_eq!(
            config.ledger.state_file.as_deref(),
            Some(Path::new("/var/lib/ledger.json"))
        );
    }

    #[test]
    fn invalid_override_is_rejected() {
        let mut config = NodeConfig::default();
        let result = config.apply_overrides(env(&[("PROMETHEUS_ENABLED", "maybe")]));
        assert!(matches!(
            result,
            Err(ConfigError::InvalidOverride {
                name: "PROMETHEUS_ENABLED",
                ..
            })
        ));
    }

    #[test]
    fn mistyped_values_are_a_yaml_error() {
        assert!(matches!(
            NodeConfig::parse("prometheus:\n  enabled: sometimes\n"),
            Err(ConfigError::Yaml { .. })
        ));
    }
}
