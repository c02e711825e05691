//! Error types for blocking round trips.

use std::time::Duration;

use thiserror::Error;

use crate::transport::TransportError;

/// Errors returned by
/// [`CorrelationBridge::send_and_wait`](super::CorrelationBridge::send_and_wait).
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The command could not be written.
    #[error("failed to send command: {source}")]
    Send {
        #[source]
        source: TransportError,
    },
    /// No message arrived before the deadline.
    #[error("no reply received within {timeout:?}")]
    Timeout { timeout: Duration },
    /// Another caller is already waiting for a reply on this connection.
    #[error("another caller is already awaiting a reply")]
    Busy,
    /// The connection was closed or lost before a reply arrived.
    #[error("connection is closed")]
    ConnectionClosed,
}

impl From<TransportError> for BridgeError {
    fn from(source: TransportError) -> Self {
        match source {
            TransportError::Closed => Self::ConnectionClosed,
            source => Self::Send { source },
        }
    }
}
