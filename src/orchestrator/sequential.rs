use tracing::debug;

use super::{run_collector, ScrapeOrchestrator};
use crate::domain::MetricRecord;

impl ScrapeOrchestrator {
    /// Visit entries one after another in registration order.
    pub(super) async fn collect_sequential(&self) -> Vec<MetricRecord> {
        let mut records = Vec::new();

        for slot in &self.entries {
            let mut entry = slot.entry.lock().await;
            if !entry.is_ready().await {
                debug!(device = %slot.name, "Device not ready, skipping");
                continue;
            }

            for (index, collector) in self.registry.collectors().iter().enumerate() {
                run_collector(&mut entry, index, collector.as_ref(), &mut records).await;
            }
            entry.is_done().await;
        }

        records
    }
}
