//! Decoded inbound messages.

use super::error::CodecError;
use super::records::{Record, decode_records};
use super::text::base64_url_decode;

/// One decoded inbound line: a tag followed by its ordered fields.
///
/// Messages are produced only by [`decode`](super::decode) and never change
/// afterwards. Accessors are tolerant of short messages because the protocol
/// has no versioning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    tag: String,
    fields: Vec<String>,
}

impl Message {
    pub(crate) fn new(tag: String, fields: Vec<String>) -> Self {
        Self { tag, fields }
    }

    /// Leading token identifying the message type.
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Fields following the tag, in wire order.
    #[must_use]
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Returns the field at `index`, or `None` for short messages.
    #[must_use]
    pub fn field(&self, index: usize) -> Option<&str> {
        self.fields.get(index).map(String::as_str)
    }

    /// Decodes the record list carried by the field at `index`.
    ///
    /// A missing field is treated like an empty list.
    #[must_use]
    pub fn records(&self, index: usize) -> Vec<Record> {
        self.field(index).map(decode_records).unwrap_or_default()
    }

    /// Decodes the base64-escaped free text carried by the field at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::MissingField`] for short messages and
    /// [`CodecError::InvalidBase64`] when the field is not escaped text.
    pub fn text(&self, index: usize) -> Result<String, CodecError> {
        let field = self.field(index).ok_or_else(|| CodecError::MissingField {
            tag: self.tag.clone(),
            index,
        })?;
        base64_url_decode(field)
    }

    /// Reassembles the message into its wire form (without terminator).
    #[must_use]
    pub fn to_line(&self) -> String {
        super::encode(&self.tag, &self.fields)
    }
}
