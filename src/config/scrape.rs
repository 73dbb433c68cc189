//! Batch scheduling configuration.

use std::time::Duration;

use serde::Deserialize;

/// Controls how one scrape batch walks the device fleet.
#[derive(Debug, Clone, Deserialize)]
pub struct ScrapeConfig {
    /// Upper bound on devices processed concurrently in parallel mode.
    #[serde(default = "default_max_worker_threads")]
    pub max_worker_threads: usize,
    /// Per-device collection deadline (seconds).
    #[serde(default = "default_max_scrape_duration_secs")]
    pub max_scrape_duration_secs: u64,
    /// Whole-batch collection deadline (seconds).
    #[serde(default = "default_total_max_scrape_duration_secs")]
    pub total_max_scrape_duration_secs: u64,
    /// Batches requested sooner than this after the previous one are dropped (seconds).
    #[serde(default = "default_minimal_collect_interval_secs")]
    pub minimal_collect_interval_secs: u64,
    /// Poll devices with bounded concurrency instead of one after another.
    #[serde(default)]
    pub fetch_in_parallel: bool,
    /// Keep device connections open between batches.
    #[serde(default = "default_true")]
    pub persistent_connection_pool: bool,
    /// Keep DHCP lease tables cached between batches.
    #[serde(default = "default_true")]
    pub persistent_lease_cache: bool,
    /// Interval between batches when running as a daemon (seconds).
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

const fn default_max_worker_threads() -> usize {
    5
}

const fn default_max_scrape_duration_secs() -> u64 {
    30
}

const fn default_total_max_scrape_duration_secs() -> u64 {
    90
}

const fn default_minimal_collect_interval_secs() -> u64 {
    5
}

const fn default_interval_secs() -> u64 {
    30
}

const fn default_true() -> bool {
    true
}

impl ScrapeConfig {
    #[must_use]
    pub fn max_scrape_duration(&self) -> Duration {
        Duration::from_secs(self.max_scrape_duration_secs)
    }

    #[must_use]
    pub fn total_max_scrape_duration(&self) -> Duration {
        Duration::from_secs(self.total_max_scrape_duration_secs)
    }

    #[must_use]
    pub fn minimal_collect_interval(&self) -> Duration {
        Duration::from_secs(self.minimal_collect_interval_secs)
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            max_worker_threads: default_max_worker_threads(),
            max_scrape_duration_secs: default_max_scrape_duration_secs(),
            total_max_scrape_duration_secs: default_total_max_scrape_duration_secs(),
            minimal_collect_interval_secs: default_minimal_collect_interval_secs(),
            fetch_in_parallel: false,
            persistent_connection_pool: true,
            persistent_lease_cache: true,
            interval_secs: default_interval_secs(),
        }
    }
}
