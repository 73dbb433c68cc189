//! Collector registry and the collectors that ship with the crate.

mod builtin;
mod registry;

pub use builtin::{CollectionTimeCollector, DhcpLeaseCollector, UpCollector, DHCP_FEATURE};
pub use registry::CollectorRegistry;
