use std::sync::Arc;

use tokio::sync::{OwnedMutexGuard, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, warn};

use super::{run_collector, ScrapeOrchestrator};
use crate::collector::CollectorRegistry;
use crate::deadline::DeadlineToken;
use crate::device::DeviceEntry;
use crate::domain::MetricRecord;

impl ScrapeOrchestrator {
    /// Dispatch ready entries to at most `max_worker_threads` concurrent
    /// tasks under a batch deadline and per-entry deadlines.
    ///
    /// Readiness is checked on the dispatching task, in registration order.
    /// Results are merged in completion order.
    pub(super) async fn collect_parallel(&self) -> Vec<MetricRecord> {
        let global = DeadlineToken::arm(self.settings.total_max_scrape_duration());
        let workers = Arc::new(Semaphore::new(self.settings.max_worker_threads.max(1)));
        let mut tasks = JoinSet::new();

        for slot in &self.entries {
            if global.is_fired() {
                warn!(device = %slot.name, "Batch deadline reached, device skipped");
                continue;
            }

            let entry = slot.entry.clone().lock_owned().await;
            if !entry.is_ready().await {
                debug!(device = %slot.name, "Device not ready, skipping");
                continue;
            }

            let job = EntryJob {
                entry,
                registry: self.registry.clone(),
                workers: workers.clone(),
                deadline: DeadlineToken::arm(self.settings.max_scrape_duration()),
                global: global.clone(),
            };
            tasks.spawn(job.run());
        }

        let mut records = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(mut partial) => records.append(&mut partial),
                Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
                Err(err) => warn!(error = %err, "Device task cancelled"),
            }
        }

        global.disarm();
        records
    }
}

/// One entry's collection pass, run on its own task.
struct EntryJob {
    entry: OwnedMutexGuard<DeviceEntry>,
    registry: Arc<CollectorRegistry>,
    workers: Arc<Semaphore>,
    /// Armed at dispatch, so time spent waiting for a worker counts.
    deadline: DeadlineToken,
    global: DeadlineToken,
}

impl EntryJob {
    async fn run(self) -> Vec<MetricRecord> {
        let Self {
            mut entry,
            registry,
            workers,
            deadline,
            global,
        } = self;
        let mut records = Vec::new();

        // The semaphore is never closed while tasks are running.
        let Ok(_permit) = workers.acquire_owned().await else {
            return records;
        };

        for (index, collector) in registry.collectors().iter().enumerate() {
            let scope = if global.is_fired() {
                Some("batch")
            } else if deadline.is_fired() {
                Some("device")
            } else {
                None
            };
            if let Some(scope) = scope {
                warn!(
                    device = %entry.name(),
                    deadline = scope,
                    completed = index,
                    skipped = registry.len() - index,
                    next = collector.name(),
                    "Deadline reached, stopping collection early"
                );
                break;
            }
            run_collector(&mut entry, index, collector.as_ref(), &mut records).await;
        }

        deadline.disarm();
        entry.is_done().await;
        records
    }
}
