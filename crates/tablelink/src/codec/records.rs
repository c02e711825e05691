//! Record lists nested inside a single protocol field.
//!
//! List payloads (table rows, waiting-list entries, reservations for a date)
//! travel as one field: records separated by `~`, sub-fields separated by
//! `,`. A list with no entries is sent as the literal `EMPTY`.

use super::error::CodecError;
use super::text::base64_url_decode;

/// Separator between records inside a record-list field.
pub const RECORD_SEPARATOR: char = '~';

/// Separator between sub-fields of one record.
pub const SUBFIELD_SEPARATOR: char = ',';

/// Sentinel sent in place of a record list with no entries.
pub const EMPTY_SENTINEL: &str = "EMPTY";

/// One entry of a record list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    fields: Vec<String>,
}

impl Record {
    /// Creates a record from its sub-fields.
    #[must_use]
    pub fn new(fields: Vec<String>) -> Self {
        Self { fields }
    }

    /// Sub-fields in wire order.
    #[must_use]
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Returns the sub-field at `index`, if present.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&str> {
        self.fields.get(index).map(String::as_str)
    }

    /// Decodes a base64-escaped free-text sub-field.
    ///
    /// Returns `None` when the record is shorter than `index + 1`.
    pub fn text(&self, index: usize) -> Option<Result<String, CodecError>> {
        self.get(index).map(base64_url_decode)
    }

    /// Number of sub-fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the record carries no sub-fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for Record {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(Into::into).collect())
    }
}

/// Splits a record-list field into records.
///
/// An empty field and the `EMPTY` sentinel both yield no records.
#[must_use]
pub fn decode_records(field: &str) -> Vec<Record> {
    if field.is_empty() || field == EMPTY_SENTINEL {
        return Vec::new();
    }
    field
        .split(RECORD_SEPARATOR)
        .map(|record| record.split(SUBFIELD_SEPARATOR).collect())
        .collect()
}

/// Joins records into a record-list field.
///
/// Sub-fields are inserted verbatim; free text must already be escaped with
/// [`base64_url_encode`](super::base64_url_encode). No records encode as the
/// `EMPTY` sentinel.
///
/// A list holding exactly one record whose only sub-field is empty (or a
/// record with no sub-fields) encodes as an empty field, which decodes back
/// to no records. Escaped empty text is empty, so `[[""]]` does not survive
/// the round trip; send such a value in its own field instead.
#[must_use]
pub fn encode_records(records: &[Record]) -> String {
    if records.is_empty() {
        return EMPTY_SENTINEL.to_owned();
    }
    records
        .iter()
        .map(|record| record.fields().join(","))
        .collect::<Vec<_>>()
        .join("~")
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::codec::base64_url_encode;

    fn as_vectors(records: &[Record]) -> Vec<Vec<&str>> {
        records
            .iter()
            .map(|record| record.fields().iter().map(String::as_str).collect())
            .collect()
    }

    #[rstest]
    fn splits_records_and_subfields() {
        let records = decode_records("1,2~3,4");

        assert_eq!(as_vectors(&records), vec![vec!["1", "2"], vec!["3", "4"]]);
    }

    #[rstest]
    #[case("EMPTY")]
    #[case("")]
    fn empty_sentinel_and_empty_field_yield_no_records(#[case] field: &str) {
        assert!(decode_records(field).is_empty());
    }

    #[rstest]
    fn single_record_without_separators() {
        let records = decode_records("12");

        assert_eq!(as_vectors(&records), vec![vec!["12"]]);
    }

    #[rstest]
    fn zero_records_encode_as_sentinel() {
        assert_eq!(encode_records(&[]), "EMPTY");
    }

    #[rstest]
    fn escaped_records_survive_round_trip() {
        let records = vec![
            Record::from_iter(["7", base64_url_encode("Window, by the bar").as_str(), "4"]),
            Record::from_iter(["9", base64_url_encode("Terrace~north|east").as_str(), "2"]),
        ];

        let field = encode_records(&records);

        assert_eq!(decode_records(&field), records);
    }

    #[rstest]
    #[case(vec![Record::from_iter([base64_url_encode("")])])]
    #[case(vec![Record::default()])]
    fn lone_empty_record_collapses_to_no_records(#[case] records: Vec<Record>) {
        let field = encode_records(&records);

        assert_eq!(field, "");
        assert!(decode_records(&field).is_empty());
    }

    #[rstest]
    fn empty_subfields_survive_when_the_field_is_not_empty() {
        let records = vec![Record::from_iter(["", ""]), Record::from_iter([""])];

        let field = encode_records(&records);

        assert_eq!(field, ",~");
        assert_eq!(decode_records(&field), records);
    }

    #[rstest]
    fn record_text_decodes_escaped_subfield() {
        let record = Record::from_iter(["3", base64_url_encode("Mrs. O'Neil, party").as_str()]);

        assert_eq!(
            record.text(1).expect("present").expect("valid"),
            "Mrs. O'Neil, party"
        );
        assert!(record.text(2).is_none());
    }
}
