//! Canonical test configurations.
//!
//! Single source of truth for config structs used across tests.
//! Avoids each test module defining its own slightly-different defaults.

use crate::config::{DeviceConfig, PoolConfig, ScrapeConfig};

/// Scrape settings with no rate guard and generous deadlines.
///
/// Per-entry deadline is 10s, batch deadline 60s. Override individual fields
/// on the returned struct for timing-specific tests.
pub fn scrape(fetch_in_parallel: bool, max_worker_threads: usize) -> ScrapeConfig {
    ScrapeConfig {
        max_worker_threads,
        max_scrape_duration_secs: 10,
        total_max_scrape_duration_secs: 60,
        minimal_collect_interval_secs: 0,
        fetch_in_parallel,
        persistent_connection_pool: true,
        persistent_lease_cache: true,
        interval_secs: 30,
    }
}

/// Pool config with specified limits.
pub fn pool(max_size: usize, ttl_secs: u64) -> PoolConfig {
    PoolConfig { max_size, ttl_secs }
}

/// A device named `name` at host `<name>.test`.
pub fn device(name: &str) -> DeviceConfig {
    DeviceConfig::new(name, format!("{name}.test"))
}
