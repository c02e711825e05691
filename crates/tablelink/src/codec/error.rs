//! Error types for the wire codec.

use thiserror::Error;

/// Errors raised while decoding inbound lines or escaped fields.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// The inbound line carried no content.
    #[error("malformed message: empty line")]
    MalformedMessage,

    /// A free-text field was not valid URL-safe base64 or not UTF-8.
    #[error("invalid base64 text field: {message}")]
    InvalidBase64 {
        /// Description of the decoding failure.
        message: String,
    },

    /// A field the consumer asked for is absent from the message.
    #[error("message '{tag}' has no field at index {index}")]
    MissingField {
        /// Tag of the message that was inspected.
        tag: String,
        /// Zero-based field index that was requested.
        index: usize,
    },
}
