//! Connection, reconnect backoff, and connection pool configuration.

use std::time::Duration;

use serde::Deserialize;

/// Device connection and failure backoff configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectionConfig {
    /// Timeout for opening a device session (seconds).
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Base delay before retrying a failed device (seconds).
    #[serde(default = "default_initial_delay_on_failure_secs")]
    pub initial_delay_on_failure_secs: u64,
    /// Upper bound on the retry delay (seconds).
    #[serde(default = "default_max_delay_on_failure_secs")]
    pub max_delay_on_failure_secs: u64,
    /// Every `delay_inc_div` successive failures add one base delay.
    #[serde(default = "default_delay_inc_div")]
    pub delay_inc_div: u32,
}

const fn default_connect_timeout_secs() -> u64 {
    5
}

const fn default_initial_delay_on_failure_secs() -> u64 {
    120
}

const fn default_max_delay_on_failure_secs() -> u64 {
    900
}

const fn default_delay_inc_div() -> u32 {
    5
}

impl ConnectionConfig {
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_connect_timeout_secs(),
            initial_delay_on_failure_secs: default_initial_delay_on_failure_secs(),
            max_delay_on_failure_secs: default_max_delay_on_failure_secs(),
            delay_inc_div: default_delay_inc_div(),
        }
    }
}

/// Connection pool configuration for probe queries.
#[derive(Debug, Clone, Deserialize)]
pub struct PoolConfig {
    /// Maximum number of cached connections.
    #[serde(default = "default_pool_max_size")]
    pub max_size: usize,
    /// Idle time after which a cached connection is evicted (seconds).
    #[serde(default = "default_pool_ttl_secs")]
    pub ttl_secs: u64,
}

const fn default_pool_max_size() -> usize {
    16
}

const fn default_pool_ttl_secs() -> u64 {
    300
}

impl PoolConfig {
    #[must_use]
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_size: default_pool_max_size(),
            ttl_secs: default_pool_ttl_secs(),
        }
    }
}
