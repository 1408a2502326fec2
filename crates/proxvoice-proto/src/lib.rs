//! # proxvoice-proto
//!
//! Decoding and validation of the payloads a positional-audio game plugin
//! attaches to a voice client's connection state.
//!
//! The plugin reports two strings:
//!
//! - a **context** blob, `<plugin signature> '\0' <JSON object>`, which the
//!   voice server hands to us base64-encoded;
//! - an **identity** string, a JSON object describing the character.
//!
//! Game-side reporting is untrusted and best-effort, so validation never
//! panics and never produces a fatal error: it returns a tagged
//! [`Invalid`] that callers log and move past.
//!
//! ## Quick Start
//!
//! ```rust
//! use proxvoice_proto::{decode_context, split_context, GameContext, PluginSignature};
//!
//! // "World of Warcraft 3.3.5a\0{\"map\": 571}"
//! let raw = b"V29ybGQgb2YgV2FyY3JhZnQgMy4zLjVhAHsibWFwIjogNTcxfQ==";
//! let bytes = decode_context(raw).expect("well-formed transport encoding");
//!
//! let (tag, payload) = split_context(&bytes);
//! assert!(PluginSignature::default().matches(tag));
//!
//! let context = GameContext::parse(payload.unwrap()).unwrap();
//! assert_eq!(context.map, 571);
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod context;
pub mod error;
pub mod payload;
pub mod schema;

pub use self::context::{decode_context, split_context, PluginSignature, DEFAULT_PLUGIN_SIGNATURE};
pub use self::error::{DecodeError, Invalid, InvalidReason};
pub use self::payload::{GameContext, GameIdentity, CONTEXT_SCHEMA, IDENTITY_SCHEMA};
pub use self::schema::{validate, FieldType, Schema};
