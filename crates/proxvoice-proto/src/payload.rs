//! Typed game payloads.

use crate::error::{Invalid, InvalidReason};
use crate::schema::{validate, FieldType, Schema};
use serde_json::{Map, Value};

/// Required fields of the context payload.
pub const CONTEXT_SCHEMA: Schema = &[("map", FieldType::Integer)];

/// Required fields of the identity payload.
pub const IDENTITY_SCHEMA: Schema = &[("char", FieldType::String), ("leaderguid", FieldType::Integer)];

/// Location data from the context payload.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GameContext {
    /// Id of the world map the character is on.
    pub map: i64,
}

impl GameContext {
    /// Validate and parse the JSON part of a context blob.
    pub fn parse(payload: &[u8]) -> Result<Self, Invalid> {
        let fields = validate(payload, CONTEXT_SCHEMA)?;
        Ok(Self {
            map: int_field(&fields, "map")?,
        })
    }
}

/// Character data from the identity payload.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GameIdentity {
    /// Character name.
    pub character: String,
    /// Guid of the party leader, `0` (or negative) when not in a party.
    pub leader_guid: i64,
}

impl GameIdentity {
    /// Validate and parse an identity string.
    pub fn parse(identity: &[u8]) -> Result<Self, Invalid> {
        let fields = validate(identity, IDENTITY_SCHEMA)?;
        Ok(Self {
            character: str_field(&fields, "char")?,
            leader_guid: int_field(&fields, "leaderguid")?,
        })
    }

    /// The party this character belongs to, if any.
    pub fn group_key(&self) -> Option<u64> {
        u64::try_from(self.leader_guid).ok().filter(|&guid| guid > 0)
    }
}

fn int_field(fields: &Map<String, Value>, name: &'static str) -> Result<i64, Invalid> {
    fields.get(name).and_then(Value::as_i64).ok_or_else(|| {
        Invalid::field(
            name,
            InvalidReason::WrongType {
                expected: FieldType::Integer.name(),
            },
        )
    })
}

fn str_field(fields: &Map<String, Value>, name: &'static str) -> Result<String, Invalid> {
    fields
        .get(name)
        .and_then(Value::as_str)
        .map(str::to_owned)
        .ok_or_else(|| {
            Invalid::field(
                name,
                InvalidReason::WrongType {
                    expected: FieldType::String.name(),
                },
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_parses_map() {
        let ctx = GameContext::parse(br#"{"map": 530}"#).unwrap();
        assert_eq!(ctx.map, 530);
    }

    #[test]
    fn context_requires_map() {
        let err = GameContext::parse(br#"{"Map ID": 530}"#).unwrap_err();
        assert_eq!(err.field, Some("map"));
    }

    #[test]
    fn identity_parses_fields() {
        let id = GameIdentity::parse(br#"{"char": "Jaina", "leaderguid": 77}"#).unwrap();
        assert_eq!(id.character, "Jaina");
        assert_eq!(id.leader_guid, 77);
        assert_eq!(id.group_key(), Some(77));
    }

    #[test]
    fn no_group_for_zero_or_negative_leader() {
        let solo = GameIdentity::parse(br#"{"char": "Thrall", "leaderguid": 0}"#).unwrap();
        assert_eq!(solo.group_key(), None);
        let odd = GameIdentity::parse(br#"{"char": "Thrall", "leaderguid": -4}"#).unwrap();
        assert_eq!(odd.group_key(), None);
    }

    #[test]
    fn identity_rejects_bad_leaderguid() {
        let err = GameIdentity::parse(br#"{"char": "Thrall", "leaderguid": "party"}"#).unwrap_err();
        assert_eq!(err.field, Some("leaderguid"));
    }
}
