//! Error type for the console runtime.

use std::io;
use std::sync::Arc;

use tablelink::{CommandError, SessionError, TelemetryError};
use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum ConsoleError {
    #[error("failed to load configuration: {0}")]
    LoadConfiguration(Arc<ortho_config::OrthoError>),
    #[error("failed to initialise telemetry: {0}")]
    Telemetry(#[from] TelemetryError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("invalid command: {0}")]
    Command(#[from] CommandError),
    #[error("failed to start input reader: {0}")]
    SpawnInput(io::Error),
    #[error("failed to start request thread: {0}")]
    SpawnRequest(io::Error),
    #[error("failed to read input: {0}")]
    ReadInput(io::Error),
    #[error("failed to write output: {0}")]
    WriteOutput(io::Error),
}
