//! Configuration loading and management.
//!
//! This module is split into logical submodules:
//! - [`types`]: Core config struct definitions (Config, RouterConfig, MetricsConfig)
//! - [`worldmaps`]: World map table parsing (WorldMapsConfig, WorldMaps)
//! - [`validation`]: Startup validation collecting every error found

mod defaults;
mod types;
pub mod validation;
mod worldmaps;

pub use types::{Config, ConfigError, MetricsConfig, RouterConfig};
pub use worldmaps::{WorldMap, WorldMaps, WorldMapsConfig, WorldMapsError};
