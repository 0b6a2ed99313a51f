use std::time::Duration;

use log::*;

pub const DEFAULT_SERVER: &str = "http://localhost:8000";

/// Connection settings for the storefront backend, read from `BCART_*` environment variables. The server string is
/// parsed and validated when the REST client is built.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub server: String,
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self { server: DEFAULT_SERVER.to_string(), request_timeout: Duration::from_secs(10) }
    }
}

impl ClientConfig {
    pub fn from_env_or_default() -> Self {
        let server = std::env::var("BCART_SERVER").unwrap_or_else(|_| {
            warn!("BCART_SERVER not set, using {DEFAULT_SERVER}");
            DEFAULT_SERVER.to_string()
        });
        let request_timeout = std::env::var("BCART_REQUEST_TIMEOUT")
            .ok()
            .and_then(|s| {
                s.parse::<u64>().map_err(|e| warn!("BCART_REQUEST_TIMEOUT is not a number of seconds ({e})")).ok()
            })
            .map(Duration::from_secs)
            .unwrap_or_else(|| Duration::from_secs(10));
        Self { server, request_timeout }
    }

    pub fn with_server<S: Into<String>>(mut self, server: S) -> Self {
        self.server = server.into();
        self
    }
}
