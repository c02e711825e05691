//! Interpretation of typed console lines.

use tablelink::{Command, CommandError};

const REQUEST_PREFIX: char = '?';
const QUIT: &str = "/quit";

/// What the operator asked for.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum ConsoleInput {
    Blank,
    Quit,
    /// Fire-and-forget command.
    Send(Command),
    /// Command whose reply is awaited and printed.
    Request(Command),
}

impl ConsoleInput {
    pub(crate) fn parse(line: &str) -> Result<Self, CommandError> {
        let line = line.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() {
            return Ok(Self::Blank);
        }
        if line.trim() == QUIT {
            return Ok(Self::Quit);
        }
        match line.strip_prefix(REQUEST_PREFIX) {
            Some(rest) => Command::from_line(rest.trim_start()).map(Self::Request),
            None => Command::from_line(line).map(Self::Send),
        }
    }
}
