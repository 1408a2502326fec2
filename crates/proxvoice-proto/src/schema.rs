//! Required-field schemas and typed coercion of JSON payloads.

use crate::error::{Invalid, InvalidReason};
use serde_json::{Map, Value};

/// The type a required field must coerce to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// A signed 64-bit integer. Accepts JSON integers, whole-number floats
    /// and decimal strings.
    Integer,
    /// A string. Accepts JSON strings, numbers and booleans.
    String,
}

impl FieldType {
    /// Human-readable type name used in error messages.
    pub fn name(self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::String => "string",
        }
    }

    /// Coerce `value` to this type, or `None` if it is not coercible.
    pub fn coerce(self, value: &Value) -> Option<Value> {
        match (self, value) {
            (Self::Integer, Value::Number(n)) => n
                .as_i64()
                .or_else(|| n.as_f64().and_then(whole))
                .map(Value::from),
            (Self::Integer, Value::String(s)) => s.trim().parse::<i64>().ok().map(Value::from),
            (Self::String, Value::String(_)) => Some(value.clone()),
            (Self::String, Value::Number(n)) => Some(Value::String(n.to_string())),
            (Self::String, Value::Bool(b)) => Some(Value::String(b.to_string())),
            _ => None,
        }
    }
}

/// `f` as an integer if it has no fractional part and fits in `i64`.
fn whole(f: f64) -> Option<i64> {
    // i64::MAX as f64 rounds up to 2^63, which is out of range.
    let in_range = f >= i64::MIN as f64 && f < i64::MAX as f64;
    (f.is_finite() && f.fract() == 0.0 && in_range).then_some(f as i64)
}

/// A list of required fields and the type each must coerce to.
pub type Schema = &'static [(&'static str, FieldType)];

/// Parse `payload` as a JSON object and check every field in `schema`.
///
/// Required fields are replaced by their coerced value; other fields are
/// passed through untouched.
///
/// # Errors
///
/// Returns [`Invalid`] for the first problem found: unparseable JSON, a
/// non-object document, a missing field, or a field that does not coerce.
pub fn validate(payload: &[u8], schema: Schema) -> Result<Map<String, Value>, Invalid> {
    let document: Value = serde_json::from_slice(payload)
        .map_err(|e| Invalid::payload(InvalidReason::NotJson(e.to_string())))?;

    let Value::Object(mut object) = document else {
        return Err(Invalid::payload(InvalidReason::NotAnObject));
    };

    for &(field, expected) in schema {
        let value = object
            .get(field)
            .ok_or_else(|| Invalid::field(field, InvalidReason::Missing))?;
        let coerced = expected.coerce(value).ok_or_else(|| {
            Invalid::field(
                field,
                InvalidReason::WrongType {
                    expected: expected.name(),
                },
            )
        })?;
        object.insert(field.to_string(), coerced);
    }

    Ok(object)
}
