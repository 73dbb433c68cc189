//! Per-device readiness and release.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use super::lease::{LeaseTable, LEASE_PATH};
use super::stats::CollectorStats;
use crate::config::{DeviceConfig, ScrapeConfig};
use crate::connection::Connection;
use crate::error::ConnectionError;

/// Who controls the lifetime of an entry's connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    /// Created for one configured device and kept for the process lifetime.
    Owned,
    /// Borrowed from the connection pool for a single probe.
    Pooled,
}

/// What `is_done` keeps between batches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReleasePolicy {
    pub persistent_connections: bool,
    pub persistent_lease_cache: bool,
}

impl From<&ScrapeConfig> for ReleasePolicy {
    fn from(config: &ScrapeConfig) -> Self {
        Self {
            persistent_connections: config.persistent_connection_pool,
            persistent_lease_cache: config.persistent_lease_cache,
        }
    }
}

/// One device as seen by the orchestrator.
///
/// Bundles the device's connection with the bookkeeping collectors and the
/// orchestrator need: cumulative per-collector time, an optional DHCP lease
/// cache, and an optional secondary connection to the device that serves
/// this device's leases.
pub struct DeviceEntry {
    name: String,
    host: String,
    config: Arc<DeviceConfig>,
    connection: Arc<Connection>,
    ownership: Ownership,
    release: ReleasePolicy,
    lease_source: Option<Arc<Connection>>,
    lease_cache: Option<Arc<LeaseTable>>,
    stats: CollectorStats,
}

impl DeviceEntry {
    pub fn new(
        config: Arc<DeviceConfig>,
        connection: Arc<Connection>,
        ownership: Ownership,
        release: ReleasePolicy,
    ) -> Self {
        Self {
            name: config.name.clone(),
            host: config.host.clone(),
            config,
            connection,
            ownership,
            release,
            lease_source: None,
            lease_cache: None,
            stats: CollectorStats::default(),
        }
    }

    /// Fetch leases from `source` instead of this device's own connection.
    #[must_use]
    pub fn with_lease_source(mut self, source: Arc<Connection>) -> Self {
        self.set_lease_source(source);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    pub fn connection(&self) -> &Arc<Connection> {
        &self.connection
    }

    pub fn ownership(&self) -> Ownership {
        self.ownership
    }

    /// Connect if needed and report whether the device can be polled now.
    ///
    /// `false` means "skip this device for the current batch". Connection
    /// errors stop here; backoff skips are silent.
    pub async fn is_ready(&self) -> bool {
        if self.connection.is_connected().await {
            return true;
        }
        if let Err(err) = self.connection.connect().await {
            debug!(device = %self.name, error = %err, "Device not ready");
            return false;
        }
        self.connection.is_connected().await
    }

    /// Post-collection hook.
    ///
    /// Owned entries drop their connections unless connections persist
    /// between batches; pooled entries leave that to the pool. The lease
    /// cache is cleared unless it persists.
    pub async fn is_done(&mut self) {
        if self.ownership == Ownership::Owned && !self.release.persistent_connections {
            self.connection.disconnect().await;
            if let Some(source) = &self.lease_source {
                source.disconnect().await;
            }
        }
        if !self.release.persistent_lease_cache {
            self.lease_cache = None;
        }
    }

    pub fn record_elapsed(&mut self, index: usize, collector: &str, elapsed: Duration) {
        self.stats.record(index, collector, elapsed);
    }

    pub fn stats(&self) -> &CollectorStats {
        &self.stats
    }

    pub fn set_lease_source(&mut self, source: Arc<Connection>) {
        self.lease_source = Some(source);
    }

    pub fn lease_source(&self) -> Option<&Arc<Connection>> {
        self.lease_source.as_ref()
    }

    pub fn lease_cache(&self) -> Option<&Arc<LeaseTable>> {
        self.lease_cache.as_ref()
    }

    pub fn set_lease_cache(&mut self, table: LeaseTable) {
        self.lease_cache = Some(Arc::new(table));
    }

    /// Cached lease for `mac`. Never triggers a fetch.
    pub fn lookup_lease(&self, mac: &str) -> Option<&super::Lease> {
        self.lease_cache.as_ref()?.by_mac(mac)
    }

    /// The cached lease table, fetching it on first use.
    ///
    /// Leases come from the lease-source device when one is configured,
    /// otherwise from this device.
    ///
    /// # Errors
    ///
    /// Returns a [`ConnectionError`] when the source cannot be reached or
    /// the query fails. Nothing is cached in that case.
    pub async fn lease_table(&mut self) -> Result<Arc<LeaseTable>, ConnectionError> {
        if let Some(cached) = &self.lease_cache {
            return Ok(cached.clone());
        }

        let source = self.lease_source.as_ref().unwrap_or(&self.connection);
        if !source.is_connected().await {
            source.connect().await?;
            if !source.is_connected().await {
                warn!(
                    device = %self.name,
                    source = %source.key(),
                    "Lease source is backing off"
                );
                return Err(ConnectionError::NotConnected);
            }
        }

        let rows = source.query(LEASE_PATH).await?;
        let table = Arc::new(LeaseTable::from_rows(&rows));
        debug!(device = %self.name, leases = table.len(), "Fetched lease table");
        self.lease_cache = Some(table.clone());
        Ok(table)
    }
}

impl std::fmt::Debug for DeviceEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceEntry")
            .field("name", &self.name)
            .field("host", &self.host)
            .field("ownership", &self.ownership)
            .field("lease_source", &self.lease_source.as_ref().map(|c| c.key().to_string()))
            .field("lease_cache", &self.lease_cache.as_ref().map(|t| t.len()))
            .finish_non_exhaustive()
    }
}
