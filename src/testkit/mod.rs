//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`device`]: Mock [`Connector`](crate::port::Connector) and
//!   [`DeviceSession`](crate::port::DeviceSession) implementations:
//!   `ScriptedConnector`, `MockSession`.
//! - [`collector`]: Canned collectors: `StaticCollector`, `ConcurrencyProbe`.
//! - [`config`]: Canonical test configurations (scrape, pool, devices).

pub mod collector;
pub mod config;
pub mod device;
