//! World map table: display name to numeric map id.
//!
//! The table may be given as a JSON object string (`json = '{...}'`), as a
//! native TOML table (`[worldmaps.maps]`), or both. JSON is parsed strictly:
//! the document must be an object whose values are all integers, and no name
//! may appear twice.

use serde::de::{Deserializer, Error as _, MapAccess, Visitor};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Errors building the world map table.
#[derive(Debug, Error)]
pub enum WorldMapsError {
    #[error("worldmaps.json is not an object of integer map ids: {0}")]
    Json(#[from] serde_json::Error),
    #[error("world map '{0}' is defined in both worldmaps.json and worldmaps.maps")]
    DuplicateName(String),
}

/// Raw `[worldmaps]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorldMapsConfig {
    /// JSON object mapping display name to map id.
    pub json: Option<String>,
    /// Native table mapping display name to map id.
    #[serde(default)]
    pub maps: BTreeMap<String, i64>,
}

/// One overworld channel to create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorldMap {
    pub name: String,
    pub id: i64,
}

/// The parsed table, ordered by display name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorldMaps(Vec<WorldMap>);

impl WorldMaps {
    pub fn new(maps: impl IntoIterator<Item = (String, i64)>) -> Self {
        let mut maps: Vec<WorldMap> = maps
            .into_iter()
            .map(|(name, id)| WorldMap { name, id })
            .collect();
        maps.sort_by(|a, b| a.name.cmp(&b.name));
        Self(maps)
    }

    pub fn iter(&self) -> impl Iterator<Item = &WorldMap> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// JSON map table that rejects repeated names instead of keeping the last.
struct UniqueMaps(BTreeMap<String, i64>);

impl<'de> Deserialize<'de> for UniqueMaps {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct UniqueMapsVisitor;

        impl<'de> Visitor<'de> for UniqueMapsVisitor {
            type Value = UniqueMaps;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object of map names to integer ids")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<UniqueMaps, A::Error> {
                let mut maps = BTreeMap::new();
                while let Some((name, id)) = access.next_entry::<String, i64>()? {
                    if maps.contains_key(&name) {
                        return Err(A::Error::custom(format!("duplicate world map '{}'", name)));
                    }
                    maps.insert(name, id);
                }
                Ok(UniqueMaps(maps))
            }
        }

        deserializer.deserialize_map(UniqueMapsVisitor)
    }
}

impl WorldMapsConfig {
    /// Merge both sources into one table.
    pub fn parse(&self) -> Result<WorldMaps, WorldMapsError> {
        let mut merged = self.maps.clone();
        if let Some(json) = &self.json {
            let UniqueMaps(parsed) = serde_json::from_str(json)?;
            for (name, id) in parsed {
                if merged.contains_key(&name) {
                    return Err(WorldMapsError::DuplicateName(name));
                }
                merged.insert(name, id);
            }
        }
        Ok(WorldMaps::new(merged))
    }
}
