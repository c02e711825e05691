//! Background receive loop.
//!
//! Reads newline-delimited text from the server and hands every complete line
//! to the [`LineSink`], strictly in arrival order and one at a time. The loop
//! ends on EOF, on a read error, or when a line exceeds the configured limit.

use std::io::{self, BufRead, BufReader, Read};
use std::sync::Arc;
use std::sync::atomic::Ordering;

use tracing::{debug, info, warn};

use super::{ConnectionStream, DisconnectCause, LineSink, LinkState, TRANSPORT_TARGET};

pub(super) struct ReceiveLoop {
    pub(super) endpoint: String,
    pub(super) reader: ConnectionStream,
    pub(super) sink: Arc<dyn LineSink>,
    pub(super) state: Arc<LinkState>,
    pub(super) max_line_bytes: usize,
}

impl ReceiveLoop {
    pub(super) fn run(self) {
        info!(
            target: TRANSPORT_TARGET,
            endpoint = %self.endpoint,
            "receive loop active"
        );
        let mut reader = BufReader::new(self.reader);
        let cause = loop {
            match read_line_bounded(&mut reader, self.max_line_bytes) {
                Ok(Some(bytes)) => {
                    let line = decode_line(bytes);
                    self.sink.on_line(&line);
                }
                Ok(None) => break DisconnectCause::PeerClosed,
                Err(cause) => break cause,
            }
        };

        self.state.disconnected.store(true, Ordering::SeqCst);
        if self.state.closed.load(Ordering::SeqCst) {
            debug!(
                target: TRANSPORT_TARGET,
                endpoint = %self.endpoint,
                "receive loop stopped after local close"
            );
            return;
        }

        warn!(
            target: TRANSPORT_TARGET,
            endpoint = %self.endpoint,
            cause = %cause,
            "connection lost"
        );
        self.sink.on_disconnect(&cause);
    }
}

/// Reads one line of at most `max_bytes` bytes, excluding the terminator.
///
/// Returns `Ok(None)` at a clean EOF. A final unterminated line before EOF is
/// returned as a complete line.
pub(super) fn read_line_bounded<R: Read>(
    reader: &mut BufReader<R>,
    max_bytes: usize,
) -> Result<Option<Vec<u8>>, DisconnectCause> {
    let mut buffer = Vec::new();
    // Room for the line plus a `\r\n` terminator.
    let limit = u64::try_from(max_bytes)
        .unwrap_or(u64::MAX)
        .saturating_add(2);
    let bytes_read = reader
        .by_ref()
        .take(limit)
        .read_until(b'\n', &mut buffer)
        .map_err(read_failed)?;

    if bytes_read == 0 {
        return Ok(None);
    }
    if buffer.last() == Some(&b'\n') {
        buffer.pop();
        if buffer.last() == Some(&b'\r') {
            buffer.pop();
        }
    }
    if buffer.len() > max_bytes {
        return Err(DisconnectCause::LineTooLong { limit: max_bytes });
    }
    Ok(Some(buffer))
}

fn read_failed(error: io::Error) -> DisconnectCause {
    DisconnectCause::ReadFailed {
        message: error.to_string(),
    }
}

fn decode_line(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(line) => line,
        Err(error) => {
            warn!(
                target: TRANSPORT_TARGET,
                error = %error.utf8_error(),
                "inbound line is not valid UTF-8; decoding lossily"
            );
            String::from_utf8_lossy(error.as_bytes()).into_owned()
        }
    }
}
