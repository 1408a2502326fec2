//! Error types for payload decoding and validation.
//!
//! A [`DecodeError`] means the voice server handed us a malformed transport
//! encoding (a protocol bug). An [`Invalid`] means the game plugin sent a
//! payload we cannot use; callers recover from it.

use thiserror::Error;

/// The transport encoding of a context blob was malformed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed context encoding: {0}")]
pub struct DecodeError(#[from] pub base64::DecodeError);

/// Why a payload failed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidReason {
    /// The payload was not parseable as JSON.
    NotJson(String),
    /// The payload parsed, but not as a JSON object.
    NotAnObject,
    /// A required field was absent.
    Missing,
    /// A required field was present but could not be coerced to the expected type.
    WrongType {
        /// Name of the type the field was expected to coerce to.
        expected: &'static str,
    },
}

/// A payload failed validation.
///
/// `field` is `None` when the failure is about the payload as a whole
/// (not JSON, not an object).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", describe(.field, .reason))]
pub struct Invalid {
    /// The offending field, if the failure is field-specific.
    pub field: Option<&'static str>,
    /// What went wrong.
    pub reason: InvalidReason,
}

impl Invalid {
    pub(crate) fn payload(reason: InvalidReason) -> Self {
        Self {
            field: None,
            reason,
        }
    }

    pub(crate) fn field(field: &'static str, reason: InvalidReason) -> Self {
        Self {
            field: Some(field),
            reason,
        }
    }

    /// Static label for metrics and log fields.
    pub fn code(&self) -> &'static str {
        match self.reason {
            InvalidReason::NotJson(_) => "not_json",
            InvalidReason::NotAnObject => "not_an_object",
            InvalidReason::Missing => "missing_field",
            InvalidReason::WrongType { .. } => "wrong_type",
        }
    }
}

fn describe(field: &Option<&'static str>, reason: &InvalidReason) -> String {
    match (field, reason) {
        (_, InvalidReason::NotJson(e)) => format!("payload is not JSON: {}", e),
        (_, InvalidReason::NotAnObject) => "payload is not a JSON object".to_string(),
        (Some(f), InvalidReason::Missing) => format!("'{}' is missing", f),
        (Some(f), InvalidReason::WrongType { expected }) => {
            format!("'{}' is not coercible to {}", f, expected)
        }
        (None, InvalidReason::Missing) => "required field is missing".to_string(),
        (None, InvalidReason::WrongType { expected }) => {
            format!("value is not coercible to {}", expected)
        }
    }
}
