//! Outbound commands.
//!
//! The server accepts two command shapes on the same connection: field form
//! (`TAG|field|field`), produced by [`codec::encode`](crate::codec::encode),
//! and the older word form (`#VERB arg arg`), whose arguments are separated by
//! single spaces and have no escaping scheme.

use std::fmt;

use thiserror::Error;

use crate::codec;

/// Application-level command sent before closing a session.
pub const LOGOUT: &str = "LOGOUT";

const WORD_PREFIX: char = '#';

/// Errors raised when a command cannot be framed as a single line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// The command text contains a line break, which would split the frame.
    #[error("command contains a line break: {line:?}")]
    EmbeddedLineBreak {
        /// The offending command text.
        line: String,
    },

    /// A word-form argument is empty or contains whitespace, which would
    /// shift the positions of the arguments after it.
    #[error("argument {index} of '{verb}' is empty or contains whitespace: {argument:?}")]
    UnescapedArgument {
        /// Verb of the rejected command.
        verb: String,
        /// Zero-based argument position.
        index: usize,
        /// The offending argument.
        argument: String,
    },

    /// A word-form command was built without a verb.
    #[error("command verb must be a non-empty word")]
    EmptyVerb,
}

/// A complete outbound line, immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Command {
    line: String,
}

impl Command {
    /// Builds a field-form command: `tag|field|field`.
    ///
    /// Fields are inserted verbatim; escape free text with
    /// [`base64_url_encode`](crate::codec::base64_url_encode) first.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::EmbeddedLineBreak`] if any part contains a line
    /// break.
    pub fn fields<S: AsRef<str>>(tag: &str, fields: &[S]) -> Result<Self, CommandError> {
        Self::from_line(codec::encode(tag, fields))
    }

    /// Builds a word-form command: `#VERB arg arg`.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::EmptyVerb`] for a blank verb and
    /// [`CommandError::UnescapedArgument`] when an argument is empty or
    /// contains whitespace.
    pub fn words<S: AsRef<str>>(verb: &str, args: &[S]) -> Result<Self, CommandError> {
        let verb = verb.strip_prefix(WORD_PREFIX).unwrap_or(verb);
        if verb.is_empty() || verb.contains(char::is_whitespace) {
            return Err(CommandError::EmptyVerb);
        }
        let mut line = format!("{WORD_PREFIX}{verb}");
        for (index, arg) in args.iter().enumerate() {
            let argument = arg.as_ref();
            if argument.is_empty() || argument.contains(char::is_whitespace) {
                return Err(CommandError::UnescapedArgument {
                    verb: verb.to_owned(),
                    index,
                    argument: argument.to_owned(),
                });
            }
            line.push(' ');
            line.push_str(argument);
        }
        Self::from_line(line)
    }

    /// Wraps a pre-formatted line.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::EmbeddedLineBreak`] when the text contains
    /// `\n` or `\r`.
    pub fn from_line(line: impl Into<String>) -> Result<Self, CommandError> {
        let line = line.into();
        if line.contains(['\n', '\r']) {
            return Err(CommandError::EmbeddedLineBreak { line });
        }
        Ok(Self { line })
    }

    /// The `LOGOUT` command.
    #[must_use]
    pub fn logout() -> Self {
        Self {
            line: LOGOUT.to_owned(),
        }
    }

    /// Wire text of the command, without terminator.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.line
    }
}

impl fmt::Display for Command {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.line)
    }
}
