//! Error types for the connection transport.

use std::io;

use thiserror::Error;

/// Errors surfaced while connecting to the server or writing commands.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Name resolution for a TCP endpoint failed.
    #[error("failed to resolve server address {endpoint}: {source}")]
    Resolve {
        endpoint: String,
        #[source]
        source: io::Error,
    },
    /// Name resolution succeeded but produced no addresses.
    #[error("server address {endpoint} resolved to no socket addresses")]
    ResolveEmpty { endpoint: String },
    /// The connection attempt failed or timed out.
    #[error("failed to connect to {endpoint}: {source}")]
    Connect {
        endpoint: String,
        #[source]
        source: io::Error,
    },
    /// Unix domain sockets are unavailable on this platform.
    #[cfg(not(unix))]
    #[error("unix sockets are unsupported for endpoint {endpoint}")]
    UnsupportedUnix { endpoint: String },
    /// The socket handle could not be cloned for the receive loop.
    #[error("failed to duplicate connection handle: {source}")]
    Clone {
        #[source]
        source: io::Error,
    },
    /// The receive thread could not be started.
    #[error("failed to spawn receive thread: {source}")]
    Spawn {
        #[source]
        source: io::Error,
    },
    /// `start` was called more than once.
    #[error("receive loop already started")]
    AlreadyStarted,
    /// The receive thread panicked before it was joined.
    #[error("receive thread panicked")]
    ThreadPanic,
    /// Writing or flushing a command failed.
    #[error("failed to write command: {source}")]
    Send {
        #[source]
        source: io::Error,
    },
    /// The connection was closed locally or by the peer.
    #[error("connection is closed")]
    Closed,
}
