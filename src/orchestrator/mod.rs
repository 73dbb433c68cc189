//! Batch scrape orchestration.
//!
//! A [`ScrapeOrchestrator`] owns one [`DeviceEntry`] per enabled device and
//! runs every registered collector against every ready entry, once per
//! batch:
//!
//! ```text
//! collect()
//!   │
//!   ├─ rate guard ── too soon ──▶ empty result, no device touched
//!   │
//!   ├─ sequential: entry by entry, collectors in order, is_done()
//!   │
//!   └─ parallel:   global deadline armed
//!                  per entry: skip if global fired │ is_ready()
//!                             arm entry deadline, spawn (≤ max workers)
//!                  per task:  collectors in order until either deadline
//!                             fires, then is_done()
//! ```
//!
//! Deadlines are checkpoints between collectors: a collector that has
//! started always runs to completion, and its records are kept.
//!
//! Probes (`probe`) bypass the batch entries and run the same collectors
//! against a pool-backed entry.

mod builder;
mod parallel;
mod probe;
mod sequential;

pub use builder::ScrapeOrchestratorBuilder;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures_util::StreamExt;
use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, info, info_span, Instrument};
use uuid::Uuid;

use crate::collector::CollectorRegistry;
use crate::config::{DeviceConfig, ScrapeConfig};
use crate::connection::ConnectionPool;
use crate::device::{CollectorTiming, DeviceEntry, ReleasePolicy};
use crate::domain::MetricRecord;
use crate::port::Collector;

/// Records from one admitted batch.
#[derive(Debug, Clone, Serialize)]
pub struct ScrapeBatch {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub records: Vec<MetricRecord>,
}

/// Diagnostic snapshot of one batch entry.
#[derive(Debug, Clone, Serialize)]
pub struct EntryStatus {
    pub device: String,
    pub host: String,
    pub connected: bool,
    pub successive_failures: u32,
    /// Seconds until the next connect attempt is allowed, if backing off.
    pub retry_in_secs: Option<u64>,
    pub collectors: Vec<CollectorTiming>,
}

struct EntrySlot {
    name: String,
    entry: Arc<tokio::sync::Mutex<DeviceEntry>>,
}

/// Drives batch collection across the device fleet.
///
/// Built with [`ScrapeOrchestrator::builder`]. Every dependency is injected;
/// the orchestrator holds no process-wide state.
pub struct ScrapeOrchestrator {
    settings: ScrapeConfig,
    release: ReleasePolicy,
    registry: Arc<CollectorRegistry>,
    pool: Arc<ConnectionPool>,
    /// Every configured device, enabled or not, for probes.
    devices: HashMap<String, Arc<DeviceConfig>>,
    /// Enabled devices in registration order.
    entries: Vec<EntrySlot>,
    last_batch_start: parking_lot::Mutex<Option<Instant>>,
}

impl ScrapeOrchestrator {
    /// Start building an orchestrator that opens sessions through
    /// `connector`.
    pub fn builder(connector: Arc<dyn crate::port::Connector>) -> ScrapeOrchestratorBuilder {
        ScrapeOrchestratorBuilder::new(connector)
    }

    pub fn settings(&self) -> &ScrapeConfig {
        &self.settings
    }

    pub fn registry(&self) -> &CollectorRegistry {
        &self.registry
    }

    pub fn pool(&self) -> &Arc<ConnectionPool> {
        &self.pool
    }

    /// Names of the batch entries, in registration order.
    pub fn device_names(&self) -> Vec<&str> {
        self.entries.iter().map(|slot| slot.name.as_str()).collect()
    }

    /// Run one batch and return its records.
    ///
    /// Returns an empty vector when the rate guard drops the request.
    pub async fn collect(&self) -> Vec<MetricRecord> {
        self.collect_batch()
            .await
            .map(|batch| batch.records)
            .unwrap_or_default()
    }

    /// Run one batch, or return `None` if it is requested within
    /// `minimal_collect_interval` of the previous admitted batch.
    ///
    /// # Panics
    ///
    /// A panicking collector is not caught; the panic resumes here in both
    /// modes.
    pub async fn collect_batch(&self) -> Option<ScrapeBatch> {
        if !self.admit_batch() {
            return None;
        }

        let id = Uuid::new_v4();
        let started_at = Utc::now();
        let span = info_span!("batch", id = %id);

        let records = async {
            let start = Instant::now();
            let records = if self.settings.fetch_in_parallel {
                self.collect_parallel().await
            } else {
                self.collect_sequential().await
            };
            info!(
                records = records.len(),
                elapsed_ms = millis(start.elapsed()),
                "Batch complete"
            );
            records
        }
        .instrument(span)
        .await;

        Some(ScrapeBatch {
            id,
            started_at,
            records,
        })
    }

    /// Diagnostic snapshot of every batch entry.
    ///
    /// Waits for entries that are in the middle of a batch.
    pub async fn status(&self) -> Vec<EntryStatus> {
        let mut statuses = Vec::with_capacity(self.entries.len());
        for slot in &self.entries {
            let entry = slot.entry.lock().await;
            let connection = entry.connection().status().await;
            statuses.push(EntryStatus {
                device: entry.name().to_string(),
                host: entry.host().to_string(),
                connected: connection.connected,
                successive_failures: connection.successive_failures,
                retry_in_secs: entry
                    .connection()
                    .backoff_remaining()
                    .await
                    .map(|d| d.as_secs()),
                collectors: entry.stats().iter().cloned().collect(),
            });
        }
        statuses
    }

    /// Disconnect every entry and empty the probe pool.
    pub async fn shutdown(&self) {
        for slot in &self.entries {
            let entry = slot.entry.lock().await;
            entry.connection().disconnect().await;
            if let Some(source) = entry.lease_source() {
                source.disconnect().await;
            }
        }
        self.pool.clear().await;
        info!(devices = self.entries.len(), "Orchestrator shut down");
    }

    /// Rate guard. Admitting a batch stamps its start time.
    fn admit_batch(&self) -> bool {
        let now = Instant::now();
        let min_interval = self.settings.minimal_collect_interval();
        let mut last = self.last_batch_start.lock();

        if let Some(previous) = *last {
            let since = now.saturating_duration_since(previous);
            if since < min_interval {
                info!(
                    since_ms = millis(since),
                    min_interval_secs = min_interval.as_secs(),
                    "Batch requested too soon after the previous one, skipping"
                );
                return false;
            }
        }
        *last = Some(now);
        true
    }
}

/// Drain one collector's stream into `out` and record how long it took.
async fn run_collector(
    entry: &mut DeviceEntry,
    index: usize,
    collector: &dyn Collector,
    out: &mut Vec<MetricRecord>,
) {
    let start = Instant::now();
    let before = out.len();
    {
        let mut stream = collector.collect(entry);
        while let Some(record) = stream.next().await {
            out.push(record);
        }
    }
    let elapsed = start.elapsed();
    entry.record_elapsed(index, collector.name(), elapsed);
    debug!(
        device = %entry.name(),
        collector = collector.name(),
        records = out.len() - before,
        elapsed_ms = millis(elapsed),
        "Collector finished"
    );
}

fn millis(d: Duration) -> u64 {
    d.as_millis().try_into().unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests;
