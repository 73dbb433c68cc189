use std::sync::Arc;

use tracing::warn;

use super::{CollectionTimeCollector, DhcpLeaseCollector, UpCollector};
use crate::port::Collector;

/// Ordered set of collectors run against every ready device.
///
/// Collectors run in registration order, and each entry's timing stats are
/// indexed by that position, so the registry is frozen once handed to an
/// orchestrator.
#[derive(Default)]
pub struct CollectorRegistry {
    collectors: Vec<Arc<dyn Collector>>,
}

impl CollectorRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in collectors: `up`, `dhcp_leases`,
    /// `collection_time`.
    #[must_use]
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(UpCollector));
        registry.register(Arc::new(DhcpLeaseCollector));
        registry.register(Arc::new(CollectionTimeCollector));
        registry
    }

    /// Append a collector. Names must be unique; a duplicate is logged and
    /// ignored, and `false` is returned.
    pub fn register(&mut self, collector: Arc<dyn Collector>) -> bool {
        if self.collectors.iter().any(|c| c.name() == collector.name()) {
            warn!(collector = collector.name(), "Duplicate collector name, ignoring");
            return false;
        }
        self.collectors.push(collector);
        true
    }

    /// Builder-style [`register`](Self::register).
    #[must_use]
    pub fn with(mut self, collector: Arc<dyn Collector>) -> Self {
        self.register(collector);
        self
    }

    #[must_use]
    pub fn collectors(&self) -> &[Arc<dyn Collector>] {
        &self.collectors
    }

    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.collectors.iter().map(|c| c.name()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.collectors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.collectors.is_empty()
    }
}
