//! Collectors that need nothing beyond the scrape core itself.

use futures_util::stream::{self, BoxStream, StreamExt};
use tracing::warn;

use crate::device::{DeviceEntry, Lease};
use crate::domain::MetricRecord;
use crate::port::Collector;

/// Device feature flag that enables [`DhcpLeaseCollector`].
pub const DHCP_FEATURE: &str = "dhcp";

/// Reports every ready device as up.
///
/// Unreachable devices never reach collectors, so their absence from a
/// batch is the "down" signal.
pub struct UpCollector;

impl Collector for UpCollector {
    fn name(&self) -> &str {
        "up"
    }

    fn collect<'a>(&'a self, entry: &'a mut DeviceEntry) -> BoxStream<'a, MetricRecord> {
        stream::once(async move {
            MetricRecord::gauge("device_up", 1.0)
                .with_help("Device answered the current scrape")
                .with_label("device", entry.name())
                .with_label("host", entry.host())
        })
        .boxed()
    }
}

/// Exports the device's DHCP leases as info records.
///
/// Only runs for devices with the `dhcp` feature. Leases come from the
/// entry's lease cache, which is filled on first use.
pub struct DhcpLeaseCollector;

impl Collector for DhcpLeaseCollector {
    fn name(&self) -> &str {
        "dhcp_leases"
    }

    fn collect<'a>(&'a self, entry: &'a mut DeviceEntry) -> BoxStream<'a, MetricRecord> {
        if !entry.config().has_feature(DHCP_FEATURE) {
            return stream::empty().boxed();
        }

        stream::once(async move {
            let device = entry.name().to_string();
            match entry.lease_table().await {
                Ok(table) => table
                    .iter()
                    .map(|lease| lease_record(&device, lease))
                    .collect::<Vec<_>>(),
                Err(err) => {
                    warn!(device = %device, error = %err, "Failed to fetch DHCP leases");
                    Vec::new()
                }
            }
        })
        .flat_map(stream::iter)
        .boxed()
    }
}

fn lease_record(device: &str, lease: &Lease) -> MetricRecord {
    let mut record = MetricRecord::info("dhcp_lease_info")
        .with_help("Active DHCP lease")
        .with_label("device", device)
        .with_label("address", lease.address.as_str())
        .with_label("mac_address", lease.mac_address.as_str());
    if let Some(name) = lease.display_name() {
        record = record.with_label("host_name", name);
    }
    if let Some(server) = &lease.server {
        record = record.with_label("server", server.as_str());
    }
    record
}

/// Exports cumulative per-collector time from the entry's stats.
///
/// Register it last so every other collector's time is included from the
/// second batch on.
pub struct CollectionTimeCollector;

impl Collector for CollectionTimeCollector {
    fn name(&self) -> &str {
        "collection_time"
    }

    fn collect<'a>(&'a self, entry: &'a mut DeviceEntry) -> BoxStream<'a, MetricRecord> {
        stream::once(async move {
            entry
                .stats()
                .iter()
                .map(|timing| {
                    MetricRecord::counter(
                        "collector_duration_seconds_total",
                        timing.total.as_secs_f64(),
                    )
                    .with_help("Cumulative time spent in each collector")
                    .with_label("device", entry.name())
                    .with_label("collector", timing.collector.as_str())
                })
                .collect::<Vec<_>>()
        })
        .flat_map(stream::iter)
        .boxed()
    }
}
