//! Failure backoff for device reconnects.
//!
//! Unlike a stream reconnect loop, a scrape never sleeps on backoff: a device
//! inside its backoff window is simply skipped for the current batch and
//! retried on a later one. The delay grows linearly in steps of
//! `initial_delay` every `inc_div` failures and is capped at `max_delay`, so
//! a permanently unreachable device keeps being retried at least once per
//! `max_delay`.

use std::time::Duration;

use crate::config::ConnectionConfig;

/// Capped, monotonically non-decreasing retry delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    initial_delay: Duration,
    max_delay: Duration,
    inc_div: u32,
}

impl BackoffPolicy {
    /// Create a policy. An `inc_div` of zero is treated as one.
    pub fn new(initial_delay: Duration, max_delay: Duration, inc_div: u32) -> Self {
        Self {
            initial_delay,
            max_delay,
            inc_div: inc_div.max(1),
        }
    }

    /// Policy that never delays a retry.
    #[must_use]
    pub fn none() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO, 1)
    }

    /// Delay imposed after `successive_failures` consecutive failures.
    ///
    /// `min(max_delay, initial_delay * (1 + successive_failures / inc_div))`
    /// with integer division.
    #[must_use]
    pub fn delay(&self, successive_failures: u32) -> Duration {
        let factor = 1 + successive_failures / self.inc_div;
        self.initial_delay
            .saturating_mul(factor)
            .min(self.max_delay)
    }

    pub fn max_delay(&self) -> Duration {
        self.max_delay
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::from(&ConnectionConfig::default())
    }
}

impl From<&ConnectionConfig> for BackoffPolicy {
    fn from(config: &ConnectionConfig) -> Self {
        Self::new(
            Duration::from_secs(config.initial_delay_on_failure_secs),
            Duration::from_secs(config.max_delay_on_failure_secs),
            config.delay_inc_div,
        )
    }
}
