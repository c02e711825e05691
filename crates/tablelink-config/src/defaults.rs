use crate::endpoint::ServerEndpoint;

/// Default TCP host of the reservation server.
pub const DEFAULT_SERVER_HOST: &str = "127.0.0.1";

/// Default TCP port of the reservation server.
pub const DEFAULT_SERVER_PORT: u16 = 5555;

/// Default time a blocking round trip waits for its reply.
pub const DEFAULT_REPLY_TIMEOUT_MS: u64 = 5_000;

/// Default time allowed for establishing the connection.
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 5_000;

/// Longest inbound line accepted before the connection is treated as broken.
pub const DEFAULT_MAX_LINE_BYTES: usize = 1024 * 1024;

/// Default log filter expression used by the binaries.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default log filter expression used by the binaries.
pub fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format for the binaries.
pub fn default_log_format() -> crate::logging::LogFormat {
    crate::logging::LogFormat::Compact
}

/// Computes the default server endpoint.
pub fn default_server_endpoint() -> ServerEndpoint {
    ServerEndpoint::tcp(DEFAULT_SERVER_HOST, DEFAULT_SERVER_PORT)
}
