use std::sync::Arc;

use tracing::{debug, info};

use super::{run_collector, ScrapeOrchestrator};
use crate::config::DeviceConfig;
use crate::device::{DeviceEntry, Ownership};
use crate::domain::MetricRecord;
use crate::error::{Error, Result};

impl ScrapeOrchestrator {
    /// One-off collection against a configured device.
    ///
    /// Runs outside the batch schedule and the rate guard, against a
    /// pool-backed entry, so repeated probes reuse the live session.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownDevice`] for a name that is not configured, and
    /// [`Error::DeviceUnavailable`] when the device cannot be reached.
    pub async fn probe(&self, device: &str) -> Result<Vec<MetricRecord>> {
        let config = self
            .devices
            .get(device)
            .cloned()
            .ok_or_else(|| Error::UnknownDevice {
                device: device.to_string(),
            })?;
        self.probe_config(config).await
    }

    /// Probe a device that need not be part of the configuration.
    ///
    /// Only the device's own connection is pooled. A lease source gets a
    /// detached connection that is closed when the probe ends, so fetching
    /// leases never evicts the connection being probed.
    ///
    /// # Errors
    ///
    /// [`Error::DeviceUnavailable`] when the device cannot be reached.
    pub async fn probe_config(&self, config: Arc<DeviceConfig>) -> Result<Vec<MetricRecord>> {
        let connection = self.pool.get(&config.connection_key()).await;
        let mut entry = DeviceEntry::new(
            config.clone(),
            connection.clone(),
            Ownership::Pooled,
            self.release,
        );

        let lease_source = config
            .remote_lease_source
            .as_deref()
            .and_then(|name| self.devices.get(name))
            .map(|source| Arc::new(self.pool.detached(&source.connection_key())));
        if let Some(source) = &lease_source {
            entry.set_lease_source(source.clone());
        }

        let result = if entry.is_ready().await {
            let mut records = Vec::new();
            for (index, collector) in self.registry.collectors().iter().enumerate() {
                run_collector(&mut entry, index, collector.as_ref(), &mut records).await;
            }
            entry.is_done().await;
            info!(device = %config.name, records = records.len(), "Probe complete");
            Ok(records)
        } else {
            Err(Error::DeviceUnavailable {
                device: config.name.clone(),
            })
        };

        if let Some(source) = lease_source {
            source.disconnect().await;
        }
        // Evicted while in use: nothing else will close it.
        if !self.pool.holds(&connection) {
            debug!(device = %config.name, "Probed connection left the pool, closing");
            connection.disconnect().await;
        }

        result
    }
}
