//! Transport decoding and splitting of the plugin context blob.
//!
//! Since Mumble 1.3 the server hands context to server-side scripts
//! base64-encoded. Once decoded, the blob is the plugin's signature string
//! followed by a NUL byte and the plugin-defined payload.

use crate::error::DecodeError;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use std::fmt;

/// Signature emitted by the supported game client plugin.
pub const DEFAULT_PLUGIN_SIGNATURE: &str = "World of Warcraft 3.3.5a";

/// Decode a transport-encoded context blob into raw bytes.
///
/// Empty input decodes to an empty blob (the user has no plugin linked).
/// ASCII whitespace is ignored, so line-wrapped encodings decode too.
///
/// # Errors
///
/// Returns [`DecodeError`] if `raw` is not valid padded base64.
pub fn decode_context(raw: &[u8]) -> Result<Vec<u8>, DecodeError> {
    if raw.is_empty() {
        return Ok(Vec::new());
    }
    if !raw.iter().any(u8::is_ascii_whitespace) {
        return Ok(BASE64.decode(raw)?);
    }
    let compact: Vec<u8> = raw.iter().copied().filter(|b| !b.is_ascii_whitespace()).collect();
    Ok(BASE64.decode(compact)?)
}

/// Split a decoded context blob into its plugin tag and payload.
///
/// Splits on the first NUL byte only; the payload may itself contain NULs.
/// Without a NUL byte the payload is `None`.
pub fn split_context(bytes: &[u8]) -> (&[u8], Option<&[u8]>) {
    match bytes.iter().position(|&b| b == 0) {
        Some(pos) => (&bytes[..pos], Some(&bytes[pos + 1..])),
        None => (bytes, None),
    }
}

/// The exact tag a context must carry to be considered linked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginSignature(String);

impl PluginSignature {
    /// Create a signature from a literal tag.
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// Whether `tag` is byte-for-byte this signature.
    pub fn matches(&self, tag: &[u8]) -> bool {
        self.0.as_bytes() == tag
    }

    /// The signature string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for PluginSignature {
    fn default() -> Self {
        Self::new(DEFAULT_PLUGIN_SIGNATURE)
    }
}

impl fmt::Display for PluginSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
