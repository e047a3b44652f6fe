//! Coordination server configuration types.

use serde::{Deserialize, Serialize};

/// Listener and session settings for `parlor-server`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
    /// TCP port (valid range: 1024-65535).
    pub port: u32,
    /// Seconds a fresh connection may take to register a name (valid range: 5-300).
    pub join_timeout_secs: u32,
    /// Outbound notifications buffered per connection (valid range: 16-4096).
    pub queue_capacity: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".into(),
            port: 2222,
            join_timeout_secs: 30,
            queue_capacity: 256,
        }
    }
}

impl ServerConfig {
    /// `host:port` string suitable for `TcpListener::bind`.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}
