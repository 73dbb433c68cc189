//! Per-collector timing kept on each device entry.

use std::time::Duration;

use serde::Serialize;

/// Cumulative time spent in one collector for one device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectorTiming {
    pub collector: String,
    #[serde(serialize_with = "serialize_secs")]
    pub total: Duration,
    pub runs: u64,
}

fn serialize_secs<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64())
}

/// Timings indexed by collector registration position.
///
/// The registry is fixed for the orchestrator's lifetime, so position is a
/// stable key and no name lookups are needed on the hot path.
#[derive(Debug, Clone, Default)]
pub struct CollectorStats {
    slots: Vec<Option<CollectorTiming>>,
}

impl CollectorStats {
    pub fn record(&mut self, index: usize, collector: &str, elapsed: Duration) {
        if self.slots.len() <= index {
            self.slots.resize(index + 1, None);
        }
        let slot = self.slots[index].get_or_insert_with(|| CollectorTiming {
            collector: collector.to_string(),
            total: Duration::ZERO,
            runs: 0,
        });
        slot.total += elapsed;
        slot.runs += 1;
    }

    pub fn get(&self, index: usize) -> Option<&CollectorTiming> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    /// Timing for the collector called `name`, if it has run.
    pub fn by_name(&self, name: &str) -> Option<&CollectorTiming> {
        self.iter().find(|t| t.collector == name)
    }

    /// Collectors that have run at least once, in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &CollectorTiming> {
        self.slots.iter().flatten()
    }

    pub fn total(&self) -> Duration {
        self.iter().map(|t| t.total).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_accumulates_per_slot() {
        let mut stats = CollectorStats::default();
        stats.record(0, "up", Duration::from_millis(5));
        stats.record(2, "dhcp_leases", Duration::from_millis(40));
        stats.record(0, "up", Duration::from_millis(7));

        let up = stats.get(0).unwrap();
        assert_eq!(up.total, Duration::from_millis(12));
        assert_eq!(up.runs, 2);
        assert!(stats.get(1).is_none());
        assert_eq!(stats.by_name("dhcp_leases").unwrap().runs, 1);
        assert_eq!(stats.total(), Duration::from_millis(52));
    }

    #[test]
    fn test_iter_skips_unrun_slots_in_order() {
        let mut stats = CollectorStats::default();
        stats.record(3, "c", Duration::ZERO);
        stats.record(1, "a", Duration::ZERO);

        let names: Vec<_> = stats.iter().map(|t| t.collector.as_str()).collect();
        assert_eq!(names, ["a", "c"]);
    }
}
