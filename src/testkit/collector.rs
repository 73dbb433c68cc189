//! Canned [`Collector`] implementations for testing.

use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{self, BoxStream, StreamExt};
use parking_lot::Mutex;

use crate::device::DeviceEntry;
use crate::domain::MetricRecord;
use crate::port::Collector;

/// Shared record of `device:collector` invocations, in call order.
pub type CallLog = Arc<Mutex<Vec<String>>>;

pub fn call_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

// ---------------------------------------------------------------------------
// StaticCollector
// ---------------------------------------------------------------------------

/// Yields a fixed list of records, each labelled with the device name.
///
/// Nothing happens until the stream is polled; an optional delay is slept
/// before the first record.
pub struct StaticCollector {
    name: String,
    records: Vec<MetricRecord>,
    delay: Option<Duration>,
    log: Option<CallLog>,
    calls: Arc<AtomicU32>,
}

impl StaticCollector {
    pub fn new(name: impl Into<String>, records: Vec<MetricRecord>) -> Self {
        Self {
            name: name.into(),
            records,
            delay: None,
            log: None,
            calls: Arc::new(AtomicU32::new(0)),
        }
    }

    /// One gauge named after the collector.
    pub fn single(name: impl Into<String>) -> Self {
        let name = name.into();
        let record = MetricRecord::gauge(name.clone(), 1.0);
        Self::new(name, vec![record])
    }

    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    #[must_use]
    pub fn with_log(mut self, log: CallLog) -> Self {
        self.log = Some(log);
        self
    }

    /// Counter incremented on every started collection pass.
    pub fn calls(&self) -> Arc<AtomicU32> {
        self.calls.clone()
    }
}

impl Collector for StaticCollector {
    fn name(&self) -> &str {
        &self.name
    }

    fn collect<'a>(&'a self, entry: &'a mut DeviceEntry) -> BoxStream<'a, MetricRecord> {
        stream::once(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(log) = &self.log {
                log.lock().push(format!("{}:{}", entry.name(), self.name));
            }
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.records
                .iter()
                .map(|r| r.clone().with_label("device", entry.name()))
                .collect::<Vec<_>>()
        })
        .flat_map(stream::iter)
        .boxed()
    }
}

// ---------------------------------------------------------------------------
// ConcurrencyProbe
// ---------------------------------------------------------------------------

/// Tracks how many collection passes are in flight at once.
///
/// Each pass holds for `hold` before yielding a single record.
pub struct ConcurrencyProbe {
    name: String,
    hold: Duration,
    current: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl ConcurrencyProbe {
    pub fn new(name: impl Into<String>, hold: Duration) -> Self {
        Self {
            name: name.into(),
            hold,
            current: Arc::new(AtomicUsize::new(0)),
            peak: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Highest observed number of concurrent passes.
    pub fn peak(&self) -> Arc<AtomicUsize> {
        self.peak.clone()
    }
}

impl Collector for ConcurrencyProbe {
    fn name(&self) -> &str {
        &self.name
    }

    fn collect<'a>(&'a self, entry: &'a mut DeviceEntry) -> BoxStream<'a, MetricRecord> {
        stream::once(async move {
            let depth = self.current.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(depth, Ordering::SeqCst);
            tokio::time::sleep(self.hold).await;
            self.current.fetch_sub(1, Ordering::SeqCst);
            MetricRecord::gauge("probe_depth", depth as f64).with_label("device", entry.name())
        })
        .boxed()
    }
}

// ---------------------------------------------------------------------------
// PanickingCollector
// ---------------------------------------------------------------------------

/// Panics when polled, to check that collector failures are not swallowed.
pub struct PanickingCollector;

impl Collector for PanickingCollector {
    fn name(&self) -> &str {
        "panics"
    }

    fn collect<'a>(&'a self, _entry: &'a mut DeviceEntry) -> BoxStream<'a, MetricRecord> {
        stream::once(async { explode() }).boxed()
    }
}

fn explode() -> MetricRecord {
    panic!("collector exploded")
}
