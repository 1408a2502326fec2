//! Core configuration types and loading.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

use super::defaults::{default_metrics_bind, default_plugin_signature, default_true};
use super::worldmaps::WorldMapsConfig;
use crate::host::ServerId;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid world maps: {0}")]
    WorldMaps(#[from] super::worldmaps::WorldMapsError),
}

/// Daemon configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Routing behaviour.
    #[serde(default)]
    pub router: RouterConfig,
    /// World map table used to build the overworld channels.
    #[serde(default)]
    pub worldmaps: WorldMapsConfig,
    /// Optional Prometheus endpoint.
    pub metrics: Option<MetricsConfig>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

/// `[router]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct RouterConfig {
    /// Virtual servers to route on. Empty means all servers.
    #[serde(default)]
    pub servers: Vec<ServerId>,
    /// Exact context tag of the supported game client plugin.
    #[serde(default = "default_plugin_signature")]
    pub plugin_signature: String,
    /// Remove a group channel once the last tracked user has left it.
    #[serde(default = "default_true")]
    pub remove_empty_groups: bool,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            servers: Vec::new(),
            plugin_signature: default_plugin_signature(),
            remove_empty_groups: default_true(),
        }
    }
}

/// `[metrics]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    /// Port for the `/metrics` endpoint.
    pub port: u16,
    /// Address to bind (default: all interfaces).
    #[serde(default = "default_metrics_bind")]
    pub bind: String,
}
