//! Line console for the reservation server.
//!
//! Delegates to [`tablelink_console::run`], which loads configuration, opens
//! a session, prints routed pushes, and forwards typed commands.

use std::io::{self, BufReader};
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut stdout = io::stdout().lock();
    let mut stderr = io::stderr().lock();
    tablelink_console::run(
        std::env::args_os(),
        BufReader::new(io::stdin()),
        &mut stdout,
        &mut stderr,
    )
}
