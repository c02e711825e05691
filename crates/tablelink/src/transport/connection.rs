//! Socket connection establishment.
//!
//! Wraps TCP and Unix domain streams in a uniform [`ConnectionStream`] so the
//! rest of the transport stays agnostic of the configured endpoint.

use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use tablelink_config::ServerEndpoint;

#[cfg(unix)]
use std::os::unix::net::UnixStream;

#[cfg(unix)]
use socket2::{Domain, SockAddr, Socket, Type};

use super::TransportError;

/// Stream types the transport can drive.
#[derive(Debug)]
pub(crate) enum ConnectionStream {
    Tcp(TcpStream),
    #[cfg(unix)]
    Unix(UnixStream),
}

impl ConnectionStream {
    /// Creates an independently owned handle to the same socket.
    pub(super) fn try_clone(&self) -> io::Result<Self> {
        match self {
            Self::Tcp(stream) => stream.try_clone().map(Self::Tcp),
            #[cfg(unix)]
            Self::Unix(stream) => stream.try_clone().map(Self::Unix),
        }
    }

    /// Shuts both halves down, waking any thread blocked in `read`.
    pub(super) fn shutdown(&self) -> io::Result<()> {
        match self {
            Self::Tcp(stream) => stream.shutdown(Shutdown::Both),
            #[cfg(unix)]
            Self::Unix(stream) => stream.shutdown(Shutdown::Both),
        }
    }
}

impl Read for ConnectionStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::Tcp(stream) => stream.read(buf),
            #[cfg(unix)]
            Self::Unix(stream) => stream.read(buf),
        }
    }
}

impl Write for ConnectionStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Tcp(stream) => stream.write(buf),
            #[cfg(unix)]
            Self::Unix(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Tcp(stream) => stream.flush(),
            #[cfg(unix)]
            Self::Unix(stream) => stream.flush(),
        }
    }
}

/// Opens a stream to the configured server endpoint.
pub(super) fn connect(
    endpoint: &ServerEndpoint,
    timeout: Duration,
) -> Result<ConnectionStream, TransportError> {
    match endpoint {
        ServerEndpoint::Tcp { host, port } => {
            let address = resolve_tcp_address(host, *port)
                .map_err(|source| TransportError::Resolve {
                    endpoint: endpoint.to_string(),
                    source,
                })?
                .ok_or_else(|| TransportError::ResolveEmpty {
                    endpoint: endpoint.to_string(),
                })?;

            let stream = TcpStream::connect_timeout(&address, timeout).map_err(|source| {
                TransportError::Connect {
                    endpoint: endpoint.to_string(),
                    source,
                }
            })?;
            // Commands are single short lines; do not hold them back.
            stream
                .set_nodelay(true)
                .map_err(|source| TransportError::Connect {
                    endpoint: endpoint.to_string(),
                    source,
                })?;
            Ok(ConnectionStream::Tcp(stream))
        }
        ServerEndpoint::Unix { path } => {
            #[cfg(unix)]
            {
                connect_unix(path.as_str(), timeout).map_err(|source| TransportError::Connect {
                    endpoint: endpoint.to_string(),
                    source,
                })
            }

            #[cfg(not(unix))]
            {
                let _ = path;
                Err(TransportError::UnsupportedUnix {
                    endpoint: endpoint.to_string(),
                })
            }
        }
    }
}

fn resolve_tcp_address(host: &str, port: u16) -> io::Result<Option<SocketAddr>> {
    Ok((host, port).to_socket_addrs()?.next())
}

#[cfg(unix)]
fn connect_unix(path: &str, timeout: Duration) -> io::Result<ConnectionStream> {
    let socket = Socket::new(Domain::UNIX, Type::STREAM, None)?;
    let address = SockAddr::unix(path)?;
    socket.connect_timeout(&address, timeout)?;
    let stream = UnixStream::from(std::os::fd::OwnedFd::from(socket));
    Ok(ConnectionStream::Unix(stream))
}
