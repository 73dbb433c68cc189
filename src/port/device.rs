//! Device API port.
//!
//! A [`Connector`] opens sessions for a [`ConnectionKey`]; a
//! [`DeviceSession`] answers request/response queries until it is closed or
//! the device goes away.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{ConnectionKey, Credentials};
use crate::error::ConnectionError;

/// One response row from the device API: field name to raw value.
pub type Row = BTreeMap<String, String>;

/// A live request/response session with one device.
///
/// Sessions are shared behind `Arc` so a query can run without holding the
/// owning connection's lock. Implementations must tolerate `close` being
/// called more than once.
#[async_trait]
pub trait DeviceSession: Send + Sync {
    /// Whether the session still believes the device is reachable.
    fn is_alive(&self) -> bool;

    /// Run one API request and return its rows.
    async fn query(&self, path: &str) -> Result<Vec<Row>, ConnectionError>;

    /// Tear the session down.
    async fn close(&self) -> Result<(), ConnectionError>;
}

/// Opens device sessions.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Open a session for `key` using the resolved `credentials`.
    ///
    /// # Errors
    ///
    /// Returns a [`ConnectionError`] when the device cannot be reached or
    /// rejects the login.
    async fn open(
        &self,
        key: &ConnectionKey,
        credentials: &Credentials,
    ) -> Result<Arc<dyn DeviceSession>, ConnectionError>;
}
