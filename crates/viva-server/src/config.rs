//! Server configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the interview server.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind (default `"127.0.0.1"`).
    pub host: String,
    /// Port to bind (default `0` for auto-assign).
    pub port: u16,
    /// Maximum concurrent WebSocket connections.
    pub max_connections: usize,
    /// Interval between server-initiated pings, in seconds.
    pub heartbeat_interval_secs: u64,
    /// Close the socket after this many seconds without a pong.
    pub heartbeat_timeout_secs: u64,
    /// Max inbound WebSocket message size in bytes.
    pub max_message_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 0,
            max_connections: 100,
            heartbeat_interval_secs: 30,
            heartbeat_timeout_secs: 90,
            max_message_size: 256 * 1024,
        }
    }
}

impl ServerConfig {
    /// The `host:port` address string to bind.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
