//! URL-safe base64 escaping for free-text fields.
//!
//! Names, e-mail addresses, and notes may contain any of the structural
//! delimiters (`|`, `~`, `,`) or whitespace. The protocol carries such values
//! as unpadded URL-safe base64 so they never collide with the framing.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

use super::error::CodecError;

/// Escapes arbitrary text for insertion into a delimited field.
#[must_use]
pub fn base64_url_encode(text: &str) -> String {
    URL_SAFE_NO_PAD.encode(text.as_bytes())
}

/// Recovers text previously escaped with [`base64_url_encode`].
///
/// # Errors
///
/// Returns [`CodecError::InvalidBase64`] when the field is not valid
/// unpadded URL-safe base64 or the payload is not UTF-8.
pub fn base64_url_decode(field: &str) -> Result<String, CodecError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(field.as_bytes())
        .map_err(|error| CodecError::InvalidBase64 {
            message: error.to_string(),
        })?;
    String::from_utf8(bytes).map_err(|error| CodecError::InvalidBase64 {
        message: error.to_string(),
    })
}
