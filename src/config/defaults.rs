//! Default value functions for configuration.

use proxvoice_proto::DEFAULT_PLUGIN_SIGNATURE;

/// Returns `true` (for serde defaults).
pub fn default_true() -> bool {
    true
}

pub fn default_plugin_signature() -> String {
    DEFAULT_PLUGIN_SIGNATURE.to_string()
}

pub fn default_metrics_bind() -> String {
    "0.0.0.0".to_string()
}
