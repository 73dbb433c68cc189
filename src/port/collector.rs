//! Collector port.

use futures_util::stream::BoxStream;

use crate::device::DeviceEntry;
use crate::domain::MetricRecord;

/// Turns a ready device entry into metric records.
///
/// `collect` returns a lazy, finite stream; nothing has to happen until the
/// orchestrator polls it, and every call starts a fresh pass. The
/// orchestrator times how long it takes to drain the stream and otherwise
/// treats the collector as opaque.
///
/// Collectors own their I/O failures: a failed device query should be logged
/// and end the stream early rather than surface to the orchestrator.
pub trait Collector: Send + Sync {
    /// Stable name used for logging and per-collector timing.
    fn name(&self) -> &str;

    /// Start a collection pass against `entry`.
    fn collect<'a>(&'a self, entry: &'a mut DeviceEntry) -> BoxStream<'a, MetricRecord>;
}
