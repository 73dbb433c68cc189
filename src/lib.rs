//! fleetscrape - scrape orchestration for fleets of network devices.
//!
//! Polls independently reachable devices over a request/response API and
//! turns their responses into metric records. Devices come and go; the crate
//! decides which ones to poll right now, backs off from the ones that keep
//! failing, and runs each batch either sequentially or with bounded
//! concurrency under per-device and whole-batch deadlines, keeping partial
//! results when a deadline fires.
//!
//! # Architecture
//!
//! - **`connection`** - Per-device connection lifecycle and backoff
//!   - `Connection` - connect/disconnect with capped linear backoff
//!   - `ConnectionPool` - TTL + LRU cache of connections for probes
//! - **`device`** - `DeviceEntry`: readiness, release, timings, lease cache
//! - **`orchestrator`** - `ScrapeOrchestrator`: rate guard, sequential and
//!   bounded-parallel batches, probes
//! - **`deadline`** - `DeadlineToken`: one-shot timer-armed cancellation
//!
//! # Modules
//!
//! - [`adapter`] - TCP reachability connector
//! - [`cli`] - Command-line interface
//! - [`collector`] - Collector registry and built-in collectors
//! - [`config`] - Configuration loading from TOML files
//! - [`domain`] - Connection keys and metric records
//! - [`error`] - Error types for the crate
//! - [`port`] - Traits for the device API and collectors
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use fleetscrape::adapter::TcpConnector;
//! use fleetscrape::collector::CollectorRegistry;
//! use fleetscrape::config::Config;
//! use fleetscrape::orchestrator::ScrapeOrchestrator;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load("fleetscrape.toml")?;
//! let orchestrator = ScrapeOrchestrator::builder(Arc::new(TcpConnector::from(&config.connection)))
//!     .config(&config)
//!     .registry(CollectorRegistry::builtin())
//!     .build()?;
//!
//! let records = orchestrator.collect().await;
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod cli;
pub mod collector;
pub mod config;
pub mod connection;
pub mod deadline;
pub mod device;
pub mod domain;
pub mod error;
pub mod orchestrator;
pub mod port;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
