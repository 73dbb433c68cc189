//! Trait definitions for the collaborators the scrape core drives.
//!
//! The core never speaks a device wire protocol and never maps raw API rows
//! to metrics itself. Both concerns sit behind the traits in this module:
//!
//! ```text
//!     ┌───────────────────────┐
//!     │  ScrapeOrchestrator   │
//!     └──────┬─────────┬──────┘
//!            │         │
//!            ▼         ▼
//!     ┌───────────┐ ┌───────────┐
//!     │ Connector │ │ Collector │
//!     │  Session  │ │ (records) │
//!     └───────────┘ └───────────┘
//! ```
//!
//! - [`Connector`] / [`DeviceSession`] - open and use a device API session
//! - [`Collector`] - turn a ready device entry into a lazy stream of records

mod collector;
mod device;

pub use collector::Collector;
pub use device::{Connector, DeviceSession, Row};
