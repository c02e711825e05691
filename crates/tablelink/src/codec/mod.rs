//! Wire codec for the line-oriented reservation protocol.
//!
//! Every message occupies one line. Inbound lines take the shape
//! `TAG|field|field|...`; bare status words such as `OK` carry no fields.
//! A field may nest a record list (see [`decode_records`]) and free text is
//! escaped with URL-safe, unpadded base64 (see [`base64_url_encode`]).
//!
//! The codec is a pure formatter: [`encode`] never escapes on the caller's
//! behalf, and [`decode`] never rejects a line for having too few or too many
//! fields. The legacy protocol carries no version, so consumers must tolerate
//! short messages through the [`Message`] accessors.

mod error;
mod message;
mod records;
mod text;

pub use error::CodecError;
pub use message::Message;
pub use records::{
    EMPTY_SENTINEL, RECORD_SEPARATOR, Record, SUBFIELD_SEPARATOR, decode_records, encode_records,
};
pub use text::{base64_url_decode, base64_url_encode};

/// Separator between the tag and each top-level field.
pub const FIELD_SEPARATOR: char = '|';

/// Joins a tag and its fields into one protocol line (without terminator).
#[must_use]
pub fn encode<S: AsRef<str>>(tag: &str, fields: &[S]) -> String {
    let capacity = fields
        .iter()
        .fold(tag.len(), |total, field| total + 1 + field.as_ref().len());
    let mut line = String::with_capacity(capacity);
    line.push_str(tag);
    for field in fields {
        line.push(FIELD_SEPARATOR);
        line.push_str(field.as_ref());
    }
    line
}

/// Decodes one inbound line into a [`Message`].
///
/// A single trailing `\n` or `\r\n` is ignored. Splitting is unlimited, so
/// trailing empty fields are preserved: `BRANCH_SETTINGS|09:00||` has three
/// fields, the last two empty.
///
/// # Errors
///
/// Returns [`CodecError::MalformedMessage`] when the line is empty.
pub fn decode(line: &str) -> Result<Message, CodecError> {
    let content = strip_terminator(line);
    if content.is_empty() {
        return Err(CodecError::MalformedMessage);
    }
    let mut parts = content.split(FIELD_SEPARATOR);
    let tag = parts.next().unwrap_or_default().to_owned();
    let fields = parts.map(str::to_owned).collect();
    Ok(Message::new(tag, fields))
}

fn strip_terminator(line: &str) -> &str {
    let without_newline = line.strip_suffix('\n').unwrap_or(line);
    without_newline
        .strip_suffix('\r')
        .unwrap_or(without_newline)
}
