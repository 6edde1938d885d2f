//! Connection lifecycle settings shared by every environment.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Timeouts and renewal margins for the connection cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionSettings {
    /// Upper bound for one connection attempt, token acquisition included.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// A cached handle whose token expires within this margin is renewed.
    #[serde(default = "default_refresh_margin")]
    pub token_refresh_margin_secs: u64,

    /// Pool size for each environment's physical connection pool.
    #[serde(default = "default_max_pool_connections")]
    pub max_pool_connections: u32,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_connect_timeout(),
            token_refresh_margin_secs: default_refresh_margin(),
            max_pool_connections: default_max_pool_connections(),
        }
    }
}

impl ConnectionSettings {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn refresh_margin(&self) -> Duration {
        Duration::from_secs(self.token_refresh_margin_secs)
    }
}

fn default_connect_timeout() -> u64 {
    30
}

fn default_refresh_margin() -> u64 {
    120
}

fn default_max_pool_connections() -> u32 {
    5
}
