//! Device entries: a connection plus the per-device state collectors use.

mod entry;
mod lease;
mod stats;

pub use entry::{DeviceEntry, Ownership, ReleasePolicy};
pub use lease::{Lease, LeaseTable, LEASE_PATH};
pub use stats::{CollectorStats, CollectorTiming};
