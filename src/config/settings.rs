//! Application configuration loading and validation.
//!
//! Provides the main [`Config`] struct that aggregates all settings.
//! Configuration is loaded from a TOML file; device passwords missing from
//! the file are taken from `FLEETSCRAPE_<DEVICE>_PASSWORD` environment
//! variables.
//!
//! # Example
//!
//! ```no_run
//! use fleetscrape::config::Config;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load("fleetscrape.toml")?;
//!     config.init_logging();
//!     Ok(())
//! }
//! ```

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;

use super::device::DeviceConfig;
use super::logging::LoggingConfig;
use super::pool::{ConnectionConfig, PoolConfig};
use super::scrape::ScrapeConfig;
use crate::error::{ConfigError, Result};

/// Main application configuration.
///
/// Load from a TOML file using [`Config::load`] or parse directly with
/// [`Config::parse_toml`]. The value is built once at startup and handed to
/// the components that need it.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Logging and tracing configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Batch scheduling, deadlines, and release policy.
    #[serde(default)]
    pub scrape: ScrapeConfig,

    /// Connect timeout and failure backoff.
    #[serde(default)]
    pub connection: ConnectionConfig,

    /// Probe connection pool limits.
    #[serde(default)]
    pub pool: PoolConfig,

    /// Devices to poll, in registration order.
    #[serde(default)]
    pub devices: Vec<DeviceConfig>,
}

/// Environment variable consulted for a device password.
///
/// The device name is upper-cased and every non-alphanumeric character
/// becomes `_`, so `edge-1` maps to `FLEETSCRAPE_EDGE_1_PASSWORD`.
#[must_use]
pub fn password_env_var(device: &str) -> String {
    let normalized: String = device
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();
    format!("FLEETSCRAPE_{normalized}_PASSWORD")
}

impl Config {
    /// Parse configuration from TOML content.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML content is malformed or validation fails.
    pub fn parse_toml(content: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;

        for device in &mut config.devices {
            if device.password.is_none() {
                device.password = std::env::var(password_env_var(&device.name)).ok();
            }
        }

        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read
    /// - The TOML content is malformed
    /// - Validation fails
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse_toml(&content)
    }

    /// Validate configuration values.
    fn validate(&self) -> Result<()> {
        let scrape = &self.scrape;
        if scrape.max_worker_threads == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_worker_threads",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if scrape.max_scrape_duration_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_scrape_duration_secs",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if scrape.total_max_scrape_duration_secs < scrape.max_scrape_duration_secs {
            return Err(ConfigError::InvalidValue {
                field: "total_max_scrape_duration_secs",
                reason: "must be >= max_scrape_duration_secs".to_string(),
            }
            .into());
        }
        if scrape.interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "interval_secs",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }

        let connection = &self.connection;
        if connection.delay_inc_div == 0 {
            return Err(ConfigError::InvalidValue {
                field: "delay_inc_div",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if connection.max_delay_on_failure_secs < connection.initial_delay_on_failure_secs {
            return Err(ConfigError::InvalidValue {
                field: "max_delay_on_failure_secs",
                reason: "must be >= initial_delay_on_failure_secs".to_string(),
            }
            .into());
        }
        if connection.connect_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "connect_timeout_secs",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }

        if self.pool.max_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "pool.max_size",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.pool.ttl_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "pool.ttl_secs",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }

        let mut names = HashSet::new();
        for device in &self.devices {
            if device.name.is_empty() {
                return Err(ConfigError::MissingField { field: "name" }.into());
            }
            if device.host.is_empty() {
                return Err(ConfigError::MissingField { field: "host" }.into());
            }
            if !names.insert(device.name.as_str()) {
                return Err(ConfigError::DuplicateDevice {
                    name: device.name.clone(),
                }
                .into());
            }
        }
        for device in &self.devices {
            if let Some(source) = &device.remote_lease_source {
                if source == &device.name || !names.contains(source.as_str()) {
                    return Err(ConfigError::UnknownLeaseSource {
                        device: device.name.clone(),
                        source_name: source.clone(),
                    }
                    .into());
                }
            }
        }

        Ok(())
    }

    /// Devices that should be polled, in registration order.
    pub fn enabled_devices(&self) -> impl Iterator<Item = &DeviceConfig> {
        self.devices.iter().filter(|d| d.enabled)
    }

    /// Look up a device by name, enabled or not.
    #[must_use]
    pub fn device(&self, name: &str) -> Option<&DeviceConfig> {
        self.devices.iter().find(|d| d.name == name)
    }

    /// Initialize logging with the configured settings.
    pub fn init_logging(&self) {
        self.logging.init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::parse_toml("").unwrap();
        assert_eq!(config.scrape.max_worker_threads, 5);
        assert_eq!(config.scrape.max_scrape_duration_secs, 30);
        assert_eq!(config.scrape.total_max_scrape_duration_secs, 90);
        assert_eq!(config.scrape.minimal_collect_interval_secs, 5);
        assert!(!config.scrape.fetch_in_parallel);
        assert!(config.scrape.persistent_connection_pool);
        assert!(config.scrape.persistent_lease_cache);
        assert_eq!(config.connection.initial_delay_on_failure_secs, 120);
        assert_eq!(config.connection.max_delay_on_failure_secs, 900);
        assert_eq!(config.connection.delay_inc_div, 5);
        assert_eq!(config.pool.ttl_secs, 300);
        assert_eq!(config.logging.level, "info");
        assert!(config.devices.is_empty());
    }

    #[test]
    fn test_password_env_var_normalizes_name() {
        assert_eq!(password_env_var("edge-1"), "FLEETSCRAPE_EDGE_1_PASSWORD");
        assert_eq!(password_env_var("Core.Router"), "FLEETSCRAPE_CORE_ROUTER_PASSWORD");
    }

    #[test]
    fn test_password_falls_back_to_environment() {
        std::env::set_var(password_env_var("envpw-unit-device"), "from-env");
        let config = Config::parse_toml(
            r#"
[[devices]]
name = "envpw-unit-device"
host = "10.1.1.1"
"#,
        )
        .unwrap();
        std::env::remove_var(password_env_var("envpw-unit-device"));

        assert_eq!(config.devices[0].password.as_deref(), Some("from-env"));
    }

    #[test]
    fn test_rejects_zero_workers() {
        let result = Config::parse_toml("[scrape]\nmax_worker_threads = 0\n");
        assert!(matches!(
            result,
            Err(Error::Config(ConfigError::InvalidValue {
                field: "max_worker_threads",
                ..
            }))
        ));
    }

    #[test]
    fn test_rejects_total_deadline_below_entry_deadline() {
        let result = Config::parse_toml(
            "[scrape]\nmax_scrape_duration_secs = 60\ntotal_max_scrape_duration_secs = 30\n",
        );
        assert!(matches!(
            result,
            Err(Error::Config(ConfigError::InvalidValue {
                field: "total_max_scrape_duration_secs",
                ..
            }))
        ));
    }

    #[test]
    fn test_rejects_self_referencing_lease_source() {
        let result = Config::parse_toml(
            r#"
[[devices]]
name = "r1"
host = "10.0.0.1"
remote_lease_source = "r1"
"#,
        );
        assert!(matches!(
            result,
            Err(Error::Config(ConfigError::UnknownLeaseSource { .. }))
        ));
    }

    #[test]
    fn test_enabled_devices_skips_disabled() {
        let config = Config::parse_toml(
            r#"
[[devices]]
name = "r1"
host = "10.0.0.1"

[[devices]]
name = "r2"
host = "10.0.0.2"
enabled = false
"#,
        )
        .unwrap();

        let names: Vec<_> = config.enabled_devices().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["r1"]);
        assert!(config.device("r2").is_some());
    }
}
