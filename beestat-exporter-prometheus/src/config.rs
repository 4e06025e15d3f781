//! Configuration for the beestat Prometheus exporter.

use beestat_common::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Default metric name prefix.
pub const DEFAULT_PREFIX: &str = "beestat";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Load(#[from] beestat_common::Error),
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Complete exporter configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExporterConfig {
    /// Upstream beestat API settings.
    #[serde(default)]
    pub beestat: BeestatConfig,

    /// Prometheus exporter settings.
    #[serde(default)]
    pub prometheus: PrometheusConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Beestat API client configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct BeestatConfig {
    /// API key issued by beestat. Usually supplied via `BEESTAT_API_KEY`.
    #[serde(default)]
    pub api_key: String,

    /// API base URL (default: "https://api.beestat.io").
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout (seconds).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Ask beestat to sync with ecobee before reading thermostats.
    #[serde(default = "default_sync")]
    pub sync: bool,
}

fn default_base_url() -> String {
    "https://api.beestat.io".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_sync() -> bool {
    true
}

impl BeestatConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for BeestatConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
            sync: default_sync(),
        }
    }
}

// Keeps the API key out of logs.
impl std::fmt::Debug for BeestatConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BeestatConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("sync", &self.sync)
            .finish()
    }
}

/// Prometheus HTTP endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrometheusConfig {
    /// Address to listen on (default: "0.0.0.0:9123").
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Path for metrics endpoint (default: "/metrics").
    #[serde(default = "default_path")]
    pub path: String,

    /// Default labels to add to all metrics.
    #[serde(default)]
    pub default_labels: HashMap<String, String>,

    /// Metric name prefix (default: "beestat").
    #[serde(default = "default_prefix")]
    pub prefix: String,
}

fn default_listen() -> String {
    "0.0.0.0:9123".to_string()
}

fn default_path() -> String {
    "/metrics".to_string()
}

fn default_prefix() -> String {
    DEFAULT_PREFIX.to_string()
}

impl PrometheusConfig {
    /// Replace the port of the listen address, keeping the host.
    pub fn set_port(&mut self, port: u16) -> Result<(), ConfigError> {
        let mut addr: std::net::SocketAddr = self.listen.parse().map_err(|_| {
            ConfigError::Validation(format!("Invalid listen address: {}", self.listen))
        })?;
        addr.set_port(port);
        self.listen = addr.to_string();
        Ok(())
    }
}

impl Default for PrometheusConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            path: default_path(),
            default_labels: HashMap::new(),
            prefix: default_prefix(),
        }
    }
}

impl ExporterConfig {
    /// Load configuration from a JSON5 file.
    ///
    /// The file is not validated here since the API key commonly arrives
    /// later from the environment; call [`ExporterConfig::validate`] once all
    /// overrides are applied.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Ok(beestat_common::load_config(path)?)
    }

    /// Parse configuration from a JSON5 string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(beestat_common::parse_config(content)?)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.beestat.api_key.trim().is_empty() {
            return Err(ConfigError::Validation(
                "beestat api_key must be set (or BEESTAT_API_KEY)".to_string(),
            ));
        }

        if !(self.beestat.base_url.starts_with("http://")
            || self.beestat.base_url.starts_with("https://"))
        {
            return Err(ConfigError::Validation(format!(
                "Invalid base_url: {}",
                self.beestat.base_url
            )));
        }

        if self.beestat.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "timeout_secs must be > 0".to_string(),
            ));
        }

        // Validate listen address format
        if self
            .prometheus
            .listen
            .parse::<std::net::SocketAddr>()
            .is_err()
        {
            return Err(ConfigError::Validation(format!(
                "Invalid listen address: {}",
                self.prometheus.listen
            )));
        }

        // Validate path starts with /
        if !self.prometheus.path.starts_with('/') {
            return Err(ConfigError::Validation(
                "Metrics path must start with /".to_string(),
            ));
        }

        Ok(())
    }
}
