//! Metric records produced by collectors.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// How a metric value should be interpreted by the publishing side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    Gauge,
    Counter,
    /// Constant `1` carrying its payload in labels.
    Info,
}

/// One sample handed to the external metrics registry.
///
/// Labels are kept in a `BTreeMap` so encoders see a stable label order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    pub name: String,
    pub kind: MetricKind,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub help: String,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    pub value: f64,
}

impl MetricRecord {
    pub fn gauge(name: impl Into<String>, value: f64) -> Self {
        Self::new(name, MetricKind::Gauge, value)
    }

    pub fn counter(name: impl Into<String>, value: f64) -> Self {
        Self::new(name, MetricKind::Counter, value)
    }

    pub fn info(name: impl Into<String>) -> Self {
        Self::new(name, MetricKind::Info, 1.0)
    }

    fn new(name: impl Into<String>, kind: MetricKind, value: f64) -> Self {
        Self {
            name: name.into(),
            kind,
            help: String::new(),
            labels: BTreeMap::new(),
            value,
        }
    }

    #[must_use]
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = help.into();
        self
    }

    #[must_use]
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels.get(key).map(String::as_str)
    }
}
