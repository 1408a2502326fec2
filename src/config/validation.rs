//! Configuration validation.
//!
//! Validates configuration at startup to catch common errors early.

use super::Config;
use std::collections::HashMap;
use thiserror::Error;

/// Validation errors for configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("router.plugin_signature must not be empty")]
    EmptyPluginSignature,
    #[error("router.plugin_signature must not contain a NUL byte")]
    NulInPluginSignature,
    #[error("{0}")]
    WorldMaps(#[from] super::worldmaps::WorldMapsError),
    #[error("no world maps configured")]
    NoWorldMaps,
    #[error("world map names must not be blank")]
    BlankMapName,
    #[error("world map '{name}' has negative map id {id}")]
    NegativeMapId { name: String, id: i64 },
    #[error("map id {id} is used by both '{first}' and '{second}'")]
    DuplicateMapId {
        id: i64,
        first: String,
        second: String,
    },
}

/// Validate a configuration, returning all errors found.
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let signature = &config.router.plugin_signature;
    if signature.is_empty() {
        errors.push(ValidationError::EmptyPluginSignature);
    }
    if signature.contains('\0') {
        errors.push(ValidationError::NulInPluginSignature);
    }

    match config.worldmaps.parse() {
        Ok(maps) => {
            if maps.is_empty() {
                errors.push(ValidationError::NoWorldMaps);
            }
            let mut seen: HashMap<i64, &str> = HashMap::new();
            for map in maps.iter() {
                if map.name.trim().is_empty() {
                    errors.push(ValidationError::BlankMapName);
                }
                if map.id < 0 {
                    errors.push(ValidationError::NegativeMapId {
                        name: map.name.clone(),
                        id: map.id,
                    });
                }
                if let Some(first) = seen.insert(map.id, &map.name) {
                    errors.push(ValidationError::DuplicateMapId {
                        id: map.id,
                        first: first.to_string(),
                        second: map.name.clone(),
                    });
                }
            }
        }
        Err(e) => errors.push(e.into()),
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
