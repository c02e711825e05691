//! Reservation server addresses.
//!
//! Operators write the server as a URL: `tcp://host[:port]` or
//! `unix:///absolute/path`. The parsed form is what the transport needs to
//! open a socket: a bare host name or IP literal (IPv6 without brackets) plus
//! a port, or a filesystem path.

use std::fmt;
use std::net::Ipv6Addr;
use std::str::FromStr;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::{Host, Url};

use crate::defaults::DEFAULT_SERVER_PORT;

/// Where the reservation server listens.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(try_from = "String", into = "String")]
pub enum ServerEndpoint {
    /// TCP listener. `host` is a DNS name or an unbracketed IP literal.
    Tcp {
        /// Host name or IP address.
        host: String,
        /// Listening port.
        port: u16,
    },
    /// Unix domain socket.
    Unix {
        /// Socket path.
        path: Utf8PathBuf,
    },
}

impl ServerEndpoint {
    /// TCP endpoint at `host:port`.
    #[must_use]
    pub fn tcp(host: impl Into<String>, port: u16) -> Self {
        Self::Tcp {
            host: host.into(),
            port,
        }
    }

    /// Unix domain socket endpoint at `path`.
    #[must_use]
    pub fn unix(path: impl Into<Utf8PathBuf>) -> Self {
        Self::Unix { path: path.into() }
    }
}

impl fmt::Display for ServerEndpoint {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tcp { host, port } if host.parse::<Ipv6Addr>().is_ok() => {
                write!(formatter, "tcp://[{host}]:{port}")
            }
            Self::Tcp { host, port } => write!(formatter, "tcp://{host}:{port}"),
            Self::Unix { path } => write!(formatter, "unix://{path}"),
        }
    }
}

impl FromStr for ServerEndpoint {
    type Err = EndpointParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let url = Url::parse(input).map_err(|source| EndpointParseError::InvalidUrl {
            input: input.to_owned(),
            source,
        })?;
        match url.scheme() {
            "tcp" => parse_tcp(input, &url),
            "unix" => parse_unix(input, &url),
            other => Err(EndpointParseError::UnsupportedScheme {
                input: input.to_owned(),
                scheme: other.to_owned(),
            }),
        }
    }
}

fn parse_tcp(input: &str, url: &Url) -> Result<ServerEndpoint, EndpointParseError> {
    let host = match url.host() {
        Some(Host::Domain(name)) if !name.is_empty() => name.to_owned(),
        Some(Host::Ipv4(address)) => address.to_string(),
        Some(Host::Ipv6(address)) => address.to_string(),
        Some(Host::Domain(_)) | None => {
            return Err(EndpointParseError::MissingHost(input.to_owned()));
        }
    };
    if !matches!(url.path(), "" | "/") || url.query().is_some() || url.fragment().is_some() {
        return Err(EndpointParseError::TrailingComponents(input.to_owned()));
    }
    Ok(ServerEndpoint::tcp(
        host,
        url.port().unwrap_or(DEFAULT_SERVER_PORT),
    ))
}

fn parse_unix(input: &str, url: &Url) -> Result<ServerEndpoint, EndpointParseError> {
    // `unix://run/x.sock` would silently drop `run` into the host slot.
    if url.host_str().is_some_and(|host| !host.is_empty()) {
        return Err(EndpointParseError::UnixHost(input.to_owned()));
    }
    match url.path() {
        "" | "/" => Err(EndpointParseError::MissingUnixPath(input.to_owned())),
        path => Ok(ServerEndpoint::unix(path)),
    }
}

impl TryFrom<String> for ServerEndpoint {
    type Error = EndpointParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ServerEndpoint> for String {
    fn from(endpoint: ServerEndpoint) -> Self {
        endpoint.to_string()
    }
}

/// Reasons a server address is rejected.
#[derive(Debug, Error)]
pub enum EndpointParseError {
    /// The text is not a URL at all.
    #[error("server address '{input}' is not a URL: {source}")]
    InvalidUrl {
        /// Rejected text.
        input: String,
        /// Parser failure.
        #[source]
        source: url::ParseError,
    },
    /// Only `tcp` and `unix` are understood.
    #[error("server address '{input}' uses unsupported scheme '{scheme}'; expected tcp or unix")]
    UnsupportedScheme {
        /// Rejected text.
        input: String,
        /// Scheme that was given.
        scheme: String,
    },
    /// A `tcp` address without a host.
    #[error("server address '{0}' names no host")]
    MissingHost(String),
    /// A `tcp` address carrying a path, query or fragment.
    #[error("server address '{0}' must not carry a path, query or fragment")]
    TrailingComponents(String),
    /// A `unix` address without a socket path.
    #[error("server address '{0}' names no socket path")]
    MissingUnixPath(String),
    /// A `unix` address whose path began in the host position.
    #[error("server address '{0}' must use an absolute path (unix:///path)")]
    UnixHost(String),
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("tcp://10.0.0.7:6000", ServerEndpoint::tcp("10.0.0.7", 6000))]
    #[case("tcp://bookings.local", ServerEndpoint::tcp("bookings.local", DEFAULT_SERVER_PORT))]
    #[case("tcp://bookings.local/", ServerEndpoint::tcp("bookings.local", DEFAULT_SERVER_PORT))]
    #[case("tcp://[::1]:6000", ServerEndpoint::tcp("::1", 6000))]
    #[case("unix:///run/tablelink.sock", ServerEndpoint::unix("/run/tablelink.sock"))]
    fn parses_server_addresses(#[case] input: &str, #[case] expected: ServerEndpoint) {
        assert_eq!(input.parse::<ServerEndpoint>().expect("valid address"), expected);
    }

    #[rstest]
    #[case(ServerEndpoint::tcp("10.0.0.7", 6000), "tcp://10.0.0.7:6000")]
    #[case(ServerEndpoint::tcp("::1", 6000), "tcp://[::1]:6000")]
    #[case(ServerEndpoint::unix("/run/tablelink.sock"), "unix:///run/tablelink.sock")]
    fn renders_parseable_addresses(#[case] endpoint: ServerEndpoint, #[case] expected: &str) {
        let rendered = endpoint.to_string();

        assert_eq!(rendered, expected);
        assert_eq!(rendered.parse::<ServerEndpoint>().expect("reparse"), endpoint);
    }

    #[rstest]
    #[case("127.0.0.1:5555", "is not a URL")]
    #[case("http://bookings.local:80", "unsupported scheme 'http'")]
    #[case("tcp://bookings.local:5555/reservations", "must not carry a path")]
    #[case("tcp://bookings.local?timeout=5", "must not carry a path")]
    #[case("unix://", "names no socket path")]
    #[case("unix://run/tablelink.sock", "absolute path")]
    fn rejects_unusable_addresses(#[case] input: &str, #[case] expected: &str) {
        let error = input
            .parse::<ServerEndpoint>()
            .expect_err("address should be rejected");

        assert!(
            error.to_string().contains(expected),
            "unexpected error: {error}"
        );
    }
}
