//! Duplex line transport over a single server connection.
//!
//! The transport owns one TCP or Unix domain stream. Writes happen on the
//! caller's thread behind a mutex; reads happen on a dedicated receive
//! thread that feeds every inbound line to a [`LineSink`].

mod connection;
mod errors;
mod receiver;

use std::fmt;
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tablelink_config::{
    Config, DEFAULT_CONNECT_TIMEOUT_MS, DEFAULT_MAX_LINE_BYTES, ServerEndpoint,
};
use tracing::{debug, info};

use crate::command::Command;

pub(crate) use self::connection::ConnectionStream;
pub use self::errors::TransportError;
use self::receiver::ReceiveLoop;

pub(crate) const TRANSPORT_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::transport");

const RECEIVE_THREAD_NAME: &str = "tablelink-receive";

/// Consumer of inbound traffic, driven from the receive thread.
pub trait LineSink: Send + Sync + 'static {
    /// Called once per inbound line, terminator removed, in arrival order.
    fn on_line(&self, line: &str);

    /// Called at most once when the connection is lost.
    ///
    /// Not called when the connection was closed locally.
    fn on_disconnect(&self, cause: &DisconnectCause);
}

/// Outbound half of a connection.
pub trait CommandSink: Send + Sync {
    /// Writes one command line.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Closed`] once the connection is gone and
    /// [`TransportError::Send`] when the write fails.
    fn send(&self, command: &Command) -> Result<(), TransportError>;
}

/// Reason the receive loop stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisconnectCause {
    /// The server closed its end of the connection.
    PeerClosed,
    /// Reading from the socket failed.
    ReadFailed {
        /// Rendered I/O error.
        message: String,
    },
    /// The server sent a line longer than the configured limit.
    LineTooLong {
        /// Maximum accepted line length in bytes.
        limit: usize,
    },
}

impl fmt::Display for DisconnectCause {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PeerClosed => formatter.write_str("server closed the connection"),
            Self::ReadFailed { message } => write!(formatter, "read failed: {message}"),
            Self::LineTooLong { limit } => {
                write!(formatter, "inbound line exceeded {limit} bytes")
            }
        }
    }
}

/// Connection tuning taken from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportOptions {
    /// Upper bound on establishing the connection.
    pub connect_timeout: Duration,
    /// Longest inbound line accepted, excluding the terminator.
    pub max_line_bytes: usize,
}

impl TransportOptions {
    /// Extracts transport settings from a loaded configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            connect_timeout: config.connect_timeout(),
            max_line_bytes: config.max_line_bytes(),
        }
    }
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_millis(DEFAULT_CONNECT_TIMEOUT_MS),
            max_line_bytes: DEFAULT_MAX_LINE_BYTES,
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct LinkState {
    pub(crate) closed: AtomicBool,
    pub(crate) disconnected: AtomicBool,
}

/// A connected, single-shot duplex transport.
#[derive(Debug)]
pub struct Transport {
    endpoint: String,
    writer: Mutex<ConnectionStream>,
    control: ConnectionStream,
    reader: Mutex<Option<ConnectionStream>>,
    state: Arc<LinkState>,
    max_line_bytes: usize,
    receiver: Mutex<Option<JoinHandle<()>>>,
}

impl Transport {
    /// Opens a connection to `endpoint`.
    ///
    /// The receive loop does not run until [`Transport::start`] is called.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] when the address cannot be resolved, the
    /// connection fails, or the stream cannot be duplicated.
    pub fn connect(
        endpoint: &ServerEndpoint,
        options: TransportOptions,
    ) -> Result<Self, TransportError> {
        let stream = connection::connect(endpoint, options.connect_timeout)?;
        let reader = stream
            .try_clone()
            .map_err(|source| TransportError::Clone { source })?;
        let control = stream
            .try_clone()
            .map_err(|source| TransportError::Clone { source })?;
        info!(
            target: TRANSPORT_TARGET,
            endpoint = %endpoint,
            "connected to server"
        );
        Ok(Self {
            endpoint: endpoint.to_string(),
            writer: Mutex::new(stream),
            control,
            reader: Mutex::new(Some(reader)),
            state: Arc::new(LinkState::default()),
            max_line_bytes: options.max_line_bytes,
            receiver: Mutex::new(None),
        })
    }

    /// Spawns the receive thread, feeding inbound lines to `sink`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::AlreadyStarted`] on a second call and
    /// [`TransportError::Spawn`] when the thread cannot be created.
    pub fn start(&self, sink: Arc<dyn LineSink>) -> Result<(), TransportError> {
        let reader = self
            .reader
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or(TransportError::AlreadyStarted)?;
        let receive_loop = ReceiveLoop {
            endpoint: self.endpoint.clone(),
            reader,
            sink,
            state: Arc::clone(&self.state),
            max_line_bytes: self.max_line_bytes,
        };
        let handle = thread::Builder::new()
            .name(RECEIVE_THREAD_NAME.to_owned())
            .spawn(move || receive_loop.run())
            .map_err(|source| TransportError::Spawn { source })?;
        *self.receiver.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);
        Ok(())
    }

    /// Writes `command` followed by a newline and flushes.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Closed`] after [`Transport::close`] or once
    /// the receive loop has seen the connection drop, and
    /// [`TransportError::Send`] when the write fails.
    pub fn send(&self, command: &Command) -> Result<(), TransportError> {
        if !self.is_open() {
            return Err(TransportError::Closed);
        }
        let mut frame = String::with_capacity(command.as_str().len() + 1);
        frame.push_str(command.as_str());
        frame.push('\n');

        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        writer
            .write_all(frame.as_bytes())
            .map_err(|source| TransportError::Send { source })?;
        writer
            .flush()
            .map_err(|source| TransportError::Send { source })?;
        debug!(
            target: TRANSPORT_TARGET,
            bytes = frame.len(),
            "command sent"
        );
        Ok(())
    }

    /// Shuts the connection down. Safe to call repeatedly and from any
    /// thread, including the receive thread.
    pub fn close(&self) {
        if self.state.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        match self.control.shutdown() {
            Err(error) if error.kind() != io::ErrorKind::NotConnected => debug!(
                target: TRANSPORT_TARGET,
                endpoint = %self.endpoint,
                error = %error,
                "socket shutdown reported an error"
            ),
            _ => {}
        }
        info!(
            target: TRANSPORT_TARGET,
            endpoint = %self.endpoint,
            "connection closed"
        );
    }

    /// Returns `true` until the connection is closed or lost.
    #[must_use]
    pub fn is_open(&self) -> bool {
        !self.state.closed.load(Ordering::SeqCst)
            && !self.state.disconnected.load(Ordering::SeqCst)
    }

    /// Returns `true` when called from this transport's receive thread.
    #[must_use]
    pub fn on_receive_thread(&self) -> bool {
        self.receiver
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|handle| handle.thread().id() == thread::current().id())
    }

    /// Waits for the receive thread to finish.
    ///
    /// Does nothing when the loop was never started, was already joined, or
    /// when called from the receive thread itself.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::ThreadPanic`] if the receive thread panicked.
    pub fn join_receiver(&self) -> Result<(), TransportError> {
        let handle = {
            let mut receiver = self.receiver.lock().unwrap_or_else(PoisonError::into_inner);
            match receiver.as_ref() {
                Some(handle) if handle.thread().id() == thread::current().id() => return Ok(()),
                Some(_) => receiver.take(),
                None => None,
            }
        };
        match handle {
            Some(handle) => handle.join().map_err(|_| TransportError::ThreadPanic),
            None => Ok(()),
        }
    }

    /// Rendered endpoint this transport is connected to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl CommandSink for Transport {
    fn send(&self, command: &Command) -> Result<(), TransportError> {
        Transport::send(self, command)
    }
}
