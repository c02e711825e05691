//! Log output formats.
//!
//! The console writes human-readable records to stderr by default. `json`
//! suits deployments that forward stderr to a log collector, and `full`
//! adds the enclosing span context to each record.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// How log records are rendered.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// One terse line per record.
    #[default]
    Compact,
    /// One line per record, including span fields.
    Full,
    /// One JSON object per record, event fields flattened.
    Json,
}

/// Error returned when a [`LogFormat`] name is not recognised.
pub type LogFormatParseError = strum::ParseError;
