//! Shared configuration for the tablelink client.
//!
//! Values are layered by [`ortho_config`]: built-in defaults, then an
//! optional configuration file, then `TABLELINK_*` environment variables,
//! then command-line flags. The resulting [`Config`] is consumed by the
//! messaging core (connection and reply timeouts, line limits) and by the
//! telemetry initialisation in the binaries.

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

mod defaults;
mod endpoint;
mod logging;

pub use defaults::{
    DEFAULT_CONNECT_TIMEOUT_MS, DEFAULT_LOG_FILTER, DEFAULT_MAX_LINE_BYTES,
    DEFAULT_REPLY_TIMEOUT_MS, DEFAULT_SERVER_HOST, DEFAULT_SERVER_PORT, default_log_filter,
    default_log_filter_string, default_log_format, default_server_endpoint,
};
pub use endpoint::{EndpointParseError, ServerEndpoint};
pub use logging::{LogFormat, LogFormatParseError};

/// Client configuration shared by the messaging core and the console.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "TABLELINK")]
pub struct Config {
    /// Endpoint of the reservation server.
    #[ortho_config(default = default_server_endpoint())]
    pub server: ServerEndpoint,
    /// Milliseconds a blocking round trip waits for its reply.
    #[ortho_config(default = DEFAULT_REPLY_TIMEOUT_MS)]
    pub reply_timeout_ms: u64,
    /// Milliseconds allowed for establishing the connection.
    #[ortho_config(default = DEFAULT_CONNECT_TIMEOUT_MS)]
    pub connect_timeout_ms: u64,
    /// Longest inbound line accepted, in bytes.
    #[ortho_config(default = DEFAULT_MAX_LINE_BYTES)]
    pub max_line_bytes: usize,
    /// Tracing filter expression (`EnvFilter` syntax).
    #[ortho_config(default = default_log_filter_string())]
    pub log_filter: String,
    /// Output format for log records.
    #[ortho_config(default = default_log_format())]
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: default_server_endpoint(),
            reply_timeout_ms: DEFAULT_REPLY_TIMEOUT_MS,
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            max_line_bytes: DEFAULT_MAX_LINE_BYTES,
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
        }
    }
}

impl Config {
    /// Endpoint of the reservation server.
    #[must_use]
    pub fn server(&self) -> &ServerEndpoint {
        &self.server
    }

    /// Deadline applied by blocking round trips that do not pass their own.
    #[must_use]
    pub fn reply_timeout(&self) -> Duration {
        Duration::from_millis(self.reply_timeout_ms)
    }

    /// Deadline applied while connecting.
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Longest inbound line accepted, in bytes.
    #[must_use]
    pub fn max_line_bytes(&self) -> usize {
        self.max_line_bytes
    }

    /// Tracing filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Output format for log records.
    #[must_use]
    pub fn log_format(&self) -> LogFormat {
        self.log_format
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn default_config_uses_documented_values() {
        let config = Config::default();

        assert_eq!(config.server(), &default_server_endpoint());
        assert_eq!(config.reply_timeout(), Duration::from_secs(5));
        assert_eq!(config.connect_timeout(), Duration::from_secs(5));
        assert_eq!(config.max_line_bytes(), DEFAULT_MAX_LINE_BYTES);
        assert_eq!(config.log_filter(), default_log_filter());
        assert_eq!(config.log_format(), LogFormat::Compact);
    }

    #[rstest]
    fn reply_timeout_is_derived_from_milliseconds() {
        let config = Config {
            reply_timeout_ms: 50,
            ..Config::default()
        };

        assert_eq!(config.reply_timeout(), Duration::from_millis(50));
    }
}
