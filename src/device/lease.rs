//! DHCP lease table cached on a device entry.

use serde::Serialize;

use crate::port::Row;

/// Device API path of the DHCP server lease table.
pub const LEASE_PATH: &str = "/ip/dhcp-server/lease";

/// One DHCP lease as reported by the lease-source device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Lease {
    pub address: String,
    pub mac_address: String,
    pub host_name: Option<String>,
    pub comment: Option<String>,
    pub server: Option<String>,
}

impl Lease {
    /// Build a lease from a raw row. Rows without an address or MAC are
    /// not leases and yield `None`.
    pub fn from_row(row: &Row) -> Option<Self> {
        let field = |name: &str| row.get(name).filter(|v| !v.is_empty()).cloned();
        Some(Self {
            address: field("address")?,
            mac_address: field("mac-address")?,
            host_name: field("host-name"),
            comment: field("comment"),
            server: field("server"),
        })
    }

    /// Comment if set, else host name.
    pub fn display_name(&self) -> Option<&str> {
        self.comment.as_deref().or(self.host_name.as_deref())
    }
}

/// Snapshot of a device's DHCP leases.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeaseTable {
    leases: Vec<Lease>,
}

impl LeaseTable {
    pub fn from_rows(rows: &[Row]) -> Self {
        Self {
            leases: rows.iter().filter_map(Lease::from_row).collect(),
        }
    }

    /// Lease for `mac`, compared case-insensitively.
    pub fn by_mac(&self, mac: &str) -> Option<&Lease> {
        self.leases
            .iter()
            .find(|lease| lease.mac_address.eq_ignore_ascii_case(mac))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Lease> {
        self.leases.iter()
    }

    pub fn len(&self) -> usize {
        self.leases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leases.is_empty()
    }
}
