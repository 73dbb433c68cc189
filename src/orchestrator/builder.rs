use std::collections::HashMap;
use std::sync::Arc;

use tracing::info;

use super::{EntrySlot, ScrapeOrchestrator};
use crate::collector::CollectorRegistry;
use crate::config::{Config, DeviceConfig, PoolConfig, ScrapeConfig};
use crate::connection::{BackoffPolicy, Connection, ConnectionPool};
use crate::device::{DeviceEntry, Ownership, ReleasePolicy};
use crate::error::ConfigError;
use crate::port::Connector;

/// Builder for [`ScrapeOrchestrator`].
///
/// # Example
///
/// ```ignore
/// let orchestrator = ScrapeOrchestrator::builder(connector)
///     .settings(config.scrape.clone())
///     .registry(CollectorRegistry::builtin())
///     .devices(config.devices.clone())
///     .build()?;
/// ```
pub struct ScrapeOrchestratorBuilder {
    connector: Arc<dyn Connector>,
    settings: ScrapeConfig,
    pool: PoolConfig,
    backoff: BackoffPolicy,
    registry: Option<CollectorRegistry>,
    devices: Vec<DeviceConfig>,
}

impl ScrapeOrchestratorBuilder {
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self {
            connector,
            settings: ScrapeConfig::default(),
            pool: PoolConfig::default(),
            backoff: BackoffPolicy::default(),
            registry: None,
            devices: Vec::new(),
        }
    }

    /// Take scrape settings, pool limits, backoff, and devices from a
    /// loaded configuration.
    #[must_use]
    pub fn config(self, config: &Config) -> Self {
        self.settings(config.scrape.clone())
            .pool(config.pool.clone())
            .backoff(BackoffPolicy::from(&config.connection))
            .devices(config.devices.iter().cloned())
    }

    #[must_use]
    pub fn settings(mut self, settings: ScrapeConfig) -> Self {
        self.settings = settings;
        self
    }

    #[must_use]
    pub fn pool(mut self, pool: PoolConfig) -> Self {
        self.pool = pool;
        self
    }

    #[must_use]
    pub fn backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }

    /// Collectors to run. Defaults to [`CollectorRegistry::builtin`].
    #[must_use]
    pub fn registry(mut self, registry: CollectorRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    #[must_use]
    pub fn device(mut self, device: DeviceConfig) -> Self {
        self.devices.push(device);
        self
    }

    #[must_use]
    pub fn devices(mut self, devices: impl IntoIterator<Item = DeviceConfig>) -> Self {
        self.devices.extend(devices);
        self
    }

    /// Create one entry per enabled device, in the order given.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::DuplicateDevice`] for repeated names and
    /// [`ConfigError::UnknownLeaseSource`] when a lease source names an
    /// unknown device or the device itself.
    pub fn build(self) -> Result<ScrapeOrchestrator, ConfigError> {
        let release = ReleasePolicy::from(&self.settings);

        let mut devices: HashMap<String, Arc<DeviceConfig>> = HashMap::new();
        for device in &self.devices {
            let previous = devices.insert(device.name.clone(), Arc::new(device.clone()));
            if previous.is_some() {
                return Err(ConfigError::DuplicateDevice {
                    name: device.name.clone(),
                });
            }
        }

        let new_connection = |config: &DeviceConfig| {
            Arc::new(Connection::new(
                config.connection_key(),
                self.connector.clone(),
                self.backoff,
            ))
        };

        let mut entries = Vec::new();
        for device in self.devices.iter().filter(|d| d.enabled) {
            let config = devices[&device.name].clone();
            let mut entry =
                DeviceEntry::new(config, new_connection(device), Ownership::Owned, release);

            if let Some(source_name) = &device.remote_lease_source {
                let source = devices
                    .get(source_name)
                    .filter(|_| source_name != &device.name)
                    .ok_or_else(|| ConfigError::UnknownLeaseSource {
                        device: device.name.clone(),
                        source_name: source_name.clone(),
                    })?;
                entry.set_lease_source(new_connection(source));
            }

            entries.push(EntrySlot {
                name: device.name.clone(),
                entry: Arc::new(tokio::sync::Mutex::new(entry)),
            });
        }

        let registry = self.registry.unwrap_or_else(CollectorRegistry::builtin);
        info!(
            devices = entries.len(),
            collectors = registry.len(),
            parallel = self.settings.fetch_in_parallel,
            "Scrape orchestrator ready"
        );

        Ok(ScrapeOrchestrator {
            release,
            registry: Arc::new(registry),
            pool: Arc::new(ConnectionPool::new(
                &self.pool,
                self.connector.clone(),
                self.backoff,
            )),
            devices,
            entries,
            settings: self.settings,
            last_batch_start: parking_lot::Mutex::new(None),
        })
    }
}
