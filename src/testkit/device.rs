//! Mock [`Connector`] and [`DeviceSession`] implementations for testing.
//!
//! [`ScriptedConnector`] hands out [`MockSession`]s and lets a test script
//! per-host failures, unreachable hosts, and slow connects. All counters are
//! shared so assertions can be made after the connector has been moved into
//! a pool or orchestrator.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::domain::{ConnectionKey, Credentials};
use crate::error::ConnectionError;
use crate::port::{Connector, DeviceSession, Row};

// ---------------------------------------------------------------------------
// MockSession
// ---------------------------------------------------------------------------

/// A session that answers queries from a fixed row table.
pub struct MockSession {
    host: String,
    alive: AtomicBool,
    rows: HashMap<String, Vec<Row>>,
    closes: Arc<AtomicU32>,
    queries: AtomicU32,
    failing_close: bool,
}

impl MockSession {
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Simulate the device dropping the session.
    pub fn kill(&self) {
        self.alive.store(false, Ordering::SeqCst);
    }

    pub fn query_count(&self) -> u32 {
        self.queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DeviceSession for MockSession {
    fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    async fn query(&self, path: &str) -> Result<Vec<Row>, ConnectionError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        if !self.is_alive() {
            return Err(ConnectionError::NotConnected);
        }
        Ok(self.rows.get(path).cloned().unwrap_or_default())
    }

    async fn close(&self) -> Result<(), ConnectionError> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        self.alive.store(false, Ordering::SeqCst);
        if self.failing_close {
            return Err(ConnectionError::Protocol("close failed".to_string()));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ScriptedConnector
// ---------------------------------------------------------------------------

/// A connector with per-host scripted outcomes.
///
/// Hosts succeed by default. Every `open` is counted as an attempt, whether
/// it succeeds or not.
#[derive(Default)]
pub struct ScriptedConnector {
    failures: Mutex<HashMap<String, u32>>,
    unreachable: Mutex<HashSet<String>>,
    delays: Mutex<HashMap<String, Duration>>,
    rows: Mutex<HashMap<String, Vec<Row>>>,
    attempts: Mutex<HashMap<String, u32>>,
    sessions: Mutex<Vec<Arc<MockSession>>>,
    last_credentials: Mutex<Option<Credentials>>,
    closes: Arc<AtomicU32>,
    failing_close: AtomicBool,
}

impl ScriptedConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `count` attempts against `host`.
    pub fn fail_next(&self, host: &str, count: u32) {
        self.failures.lock().insert(host.to_string(), count);
    }

    /// Make every attempt against `host` fail until reset.
    pub fn set_unreachable(&self, host: &str, unreachable: bool) {
        let mut hosts = self.unreachable.lock();
        if unreachable {
            hosts.insert(host.to_string());
        } else {
            hosts.remove(host);
        }
    }

    /// Delay every attempt against `host` by `delay` before it resolves.
    pub fn set_delay(&self, host: &str, delay: Duration) {
        self.delays.lock().insert(host.to_string(), delay);
    }

    /// Rows returned for `path` by sessions opened from now on.
    pub fn set_rows(&self, path: &str, rows: Vec<Row>) {
        self.rows.lock().insert(path.to_string(), rows);
    }

    /// Make session `close` calls report an error.
    pub fn set_failing_close(&self, failing: bool) {
        self.failing_close.store(failing, Ordering::SeqCst);
    }

    /// Connect attempts made against `host`.
    pub fn attempts(&self, host: &str) -> u32 {
        self.attempts.lock().get(host).copied().unwrap_or(0)
    }

    pub fn total_attempts(&self) -> u32 {
        self.attempts.lock().values().sum()
    }

    /// Session close calls across every session handed out.
    pub fn closes(&self) -> u32 {
        self.closes.load(Ordering::SeqCst)
    }

    /// Sessions handed out so far, in open order.
    pub fn sessions(&self) -> Vec<Arc<MockSession>> {
        self.sessions.lock().clone()
    }

    /// Sessions handed out for `host`.
    pub fn sessions_for(&self, host: &str) -> Vec<Arc<MockSession>> {
        self.sessions
            .lock()
            .iter()
            .filter(|s| s.host == host)
            .cloned()
            .collect()
    }

    pub fn last_credentials(&self) -> Option<Credentials> {
        self.last_credentials.lock().clone()
    }

    fn scripted_failure(&self, host: &str) -> bool {
        if self.unreachable.lock().contains(host) {
            return true;
        }
        let mut failures = self.failures.lock();
        match failures.get_mut(host) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                true
            }
            _ => false,
        }
    }
}

#[async_trait]
impl Connector for ScriptedConnector {
    async fn open(
        &self,
        key: &ConnectionKey,
        credentials: &Credentials,
    ) -> Result<Arc<dyn DeviceSession>, ConnectionError> {
        let host = key.host().to_string();
        *self.attempts.lock().entry(host.clone()).or_default() += 1;
        *self.last_credentials.lock() = Some(credentials.clone());

        let delay = self.delays.lock().get(&host).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.scripted_failure(&host) {
            return Err(ConnectionError::Refused {
                host,
                port: key.port(),
                reason: "scripted failure".to_string(),
            });
        }

        let rows = self.rows.lock().clone();
        let session = Arc::new(MockSession {
            host,
            alive: AtomicBool::new(true),
            rows,
            closes: self.closes.clone(),
            queries: AtomicU32::new(0),
            failing_close: self.failing_close.load(Ordering::SeqCst),
        });
        self.sessions.lock().push(session.clone());
        Ok(session)
    }
}
