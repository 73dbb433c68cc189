//! Device connection lifecycle.
//!
//! A [`Connection`] owns at most one device session and the failure
//! bookkeeping that gates reconnects:
//!
//! ```text
//! Disconnected ──connect()──▶ Connecting ──ok──▶ Connected
//!       ▲                         │                  │
//!       └──────────err────────────┘◀──disconnect()───┘
//! ```
//!
//! There is no explicit backoff state. After a failure, `connect()` silently
//! does nothing until the [`BackoffPolicy`] delay has elapsed since the most
//! recent failure.

mod backoff;
mod credentials;
mod pool;

pub use backoff::BackoffPolicy;
pub use pool::{ConnectionPool, PoolStats};

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::domain::ConnectionKey;
use crate::error::ConnectionError;
use crate::port::{Connector, DeviceSession, Row};

/// Point-in-time view of a connection, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionStatus {
    pub connected: bool,
    pub successive_failures: u32,
    /// Monotonic instant of the most recent failed attempt, if any.
    pub last_failure: Option<Instant>,
}

#[derive(Default)]
struct ConnectionState {
    session: Option<Arc<dyn DeviceSession>>,
    successive_failures: u32,
    last_failure: Option<Instant>,
}

impl ConnectionState {
    fn is_live(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.is_alive())
    }
}

/// One device's connection and its failure backoff.
///
/// Shared as `Arc<Connection>`; all state sits behind an async mutex so that
/// `connect()` and `disconnect()` are safe to call from any task, repeatedly.
pub struct Connection {
    key: ConnectionKey,
    connector: Arc<dyn Connector>,
    backoff: BackoffPolicy,
    state: Mutex<ConnectionState>,
}

impl Connection {
    /// Create a disconnected connection. Nothing is opened until
    /// [`connect`](Self::connect) is called.
    pub fn new(key: ConnectionKey, connector: Arc<dyn Connector>, backoff: BackoffPolicy) -> Self {
        Self {
            key,
            connector,
            backoff,
            state: Mutex::new(ConnectionState::default()),
        }
    }

    pub fn key(&self) -> &ConnectionKey {
        &self.key
    }

    /// True only if a session exists and still reports itself alive.
    pub async fn is_connected(&self) -> bool {
        self.state.lock().await.is_live()
    }

    /// Open a session unless already connected or still backing off.
    ///
    /// Both skip cases return `Ok(())`; callers check
    /// [`is_connected`](Self::is_connected) afterwards. A successful attempt
    /// clears the failure bookkeeping.
    ///
    /// # Errors
    ///
    /// Returns the connector's [`ConnectionError`] when an attempt was made
    /// and failed. The failure count and timestamp are updated first.
    pub async fn connect(&self) -> Result<(), ConnectionError> {
        let mut state = self.state.lock().await;
        if state.is_live() {
            return Ok(());
        }

        if let Some(failed_at) = state.last_failure {
            let delay = self.backoff.delay(state.successive_failures);
            let since = Instant::now().saturating_duration_since(failed_at);
            if since < delay {
                debug!(
                    connection = %self.key,
                    failures = state.successive_failures,
                    retry_in_secs = (delay - since).as_secs(),
                    "Within failure backoff, skipping connect"
                );
                return Ok(());
            }
        }

        // A session that died on its own is closed before reconnecting.
        if let Some(stale) = state.session.take() {
            close_quietly(&self.key, stale).await;
        }

        debug!(
            connection = %self.key,
            attempt = state.successive_failures + 1,
            "Connecting"
        );

        let attempt = match credentials::resolve(&self.key).await {
            Ok(credentials) => self.connector.open(&self.key, &credentials).await,
            Err(err) => Err(err),
        };

        match attempt {
            Ok(session) => {
                if state.successive_failures > 0 {
                    info!(
                        connection = %self.key,
                        previous_failures = state.successive_failures,
                        "Reconnected"
                    );
                } else {
                    info!(connection = %self.key, "Connected");
                }
                state.session = Some(session);
                state.successive_failures = 0;
                state.last_failure = None;
                Ok(())
            }
            Err(err) => {
                state.session = None;
                state.successive_failures = state.successive_failures.saturating_add(1);
                state.last_failure = Some(Instant::now());
                warn!(
                    connection = %self.key,
                    failures = state.successive_failures,
                    retry_in_secs = self.backoff.delay(state.successive_failures).as_secs(),
                    error = %err,
                    "Connection attempt failed"
                );
                Err(err)
            }
        }
    }

    /// Close the session if one is open. Idempotent; close errors are logged.
    pub async fn disconnect(&self) {
        let session = self.state.lock().await.session.take();
        if let Some(session) = session {
            close_quietly(&self.key, session).await;
            debug!(connection = %self.key, "Disconnected");
        }
    }

    /// Run one device API request through the open session.
    ///
    /// The connection lock is released before the request is sent.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError::NotConnected`] without a session, or the
    /// session's own error.
    pub async fn query(&self, path: &str) -> Result<Vec<Row>, ConnectionError> {
        let session = self
            .state
            .lock()
            .await
            .session
            .clone()
            .ok_or(ConnectionError::NotConnected)?;
        session.query(path).await
    }

    pub async fn successive_failures(&self) -> u32 {
        self.state.lock().await.successive_failures
    }

    pub async fn last_failure(&self) -> Option<Instant> {
        self.state.lock().await.last_failure
    }

    /// Time left before a reconnect attempt will be made, if backing off.
    pub async fn backoff_remaining(&self) -> Option<Duration> {
        let state = self.state.lock().await;
        let failed_at = state.last_failure?;
        let delay = self.backoff.delay(state.successive_failures);
        let elapsed = Instant::now().saturating_duration_since(failed_at);
        delay
            .checked_sub(elapsed)
            .filter(|remaining| !remaining.is_zero())
    }

    pub async fn status(&self) -> ConnectionStatus {
        let state = self.state.lock().await;
        ConnectionStatus {
            connected: state.is_live(),
            successive_failures: state.successive_failures,
            last_failure: state.last_failure,
        }
    }
}

async fn close_quietly(key: &ConnectionKey, session: Arc<dyn DeviceSession>) {
    if let Err(err) = session.close().await {
        warn!(connection = %key, error = %err, "Error while closing device session");
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::time::Duration;

    use super::*;
    use crate::testkit::device::ScriptedConnector;

    fn policy() -> BackoffPolicy {
        BackoffPolicy::new(Duration::from_secs(120), Duration::from_secs(900), 5)
    }

    fn connection(connector: &Arc<ScriptedConnector>) -> Connection {
        Connection::new(
            ConnectionKey::new("r1.test", 8728),
            connector.clone(),
            policy(),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_success_marks_connected() {
        let connector = Arc::new(ScriptedConnector::new());
        let conn = connection(&connector);

        assert!(!conn.is_connected().await);
        conn.connect().await.unwrap();
        assert!(conn.is_connected().await);
        assert_eq!(connector.attempts("r1.test"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_is_noop_when_connected() {
        let connector = Arc::new(ScriptedConnector::new());
        let conn = connection(&connector);

        conn.connect().await.unwrap();
        conn.connect().await.unwrap();
        conn.connect().await.unwrap();

        assert_eq!(connector.attempts("r1.test"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_records_count_and_timestamp() {
        let connector = Arc::new(ScriptedConnector::new());
        connector.fail_next("r1.test", 1);
        let conn = connection(&connector);

        let err = conn.connect().await.unwrap_err();
        assert!(matches!(err, ConnectionError::Refused { .. }));
        assert!(!conn.is_connected().await);
        assert_eq!(conn.successive_failures().await, 1);
        assert!(conn.last_failure().await.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_skipped_within_backoff_window() {
        let connector = Arc::new(ScriptedConnector::new());
        connector.fail_next("r1.test", 1);
        let conn = connection(&connector);

        assert!(conn.connect().await.is_err());
        tokio::time::advance(Duration::from_secs(60)).await;

        // Silent skip: no attempt, no error.
        conn.connect().await.unwrap();
        assert!(!conn.is_connected().await);
        assert_eq!(connector.attempts("r1.test"), 1);
        assert_eq!(
            conn.backoff_remaining().await,
            Some(Duration::from_secs(60))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_after_backoff_resets_bookkeeping() {
        let connector = Arc::new(ScriptedConnector::new());
        connector.fail_next("r1.test", 2);
        let conn = connection(&connector);

        assert!(conn.connect().await.is_err());
        tokio::time::advance(Duration::from_secs(120)).await;
        assert!(conn.connect().await.is_err());
        assert_eq!(conn.successive_failures().await, 2);

        tokio::time::advance(Duration::from_secs(120)).await;
        conn.connect().await.unwrap();

        assert!(conn.is_connected().await);
        assert_eq!(conn.successive_failures().await, 0);
        assert_eq!(conn.last_failure().await, None);
        assert_eq!(conn.backoff_remaining().await, None);
        assert_eq!(connector.attempts("r1.test"), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disconnect_is_idempotent() {
        let connector = Arc::new(ScriptedConnector::new());
        let conn = connection(&connector);

        conn.connect().await.unwrap();
        conn.disconnect().await;
        conn.disconnect().await;

        assert!(!conn.is_connected().await);
        assert_eq!(connector.closes(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dead_session_is_replaced_on_connect() {
        let connector = Arc::new(ScriptedConnector::new());
        let conn = connection(&connector);

        conn.connect().await.unwrap();
        connector.sessions()[0].kill();
        assert!(!conn.is_connected().await);

        conn.connect().await.unwrap();
        assert!(conn.is_connected().await);
        assert_eq!(connector.attempts("r1.test"), 2);
        assert_eq!(connector.closes(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_query_requires_session() {
        let connector = Arc::new(ScriptedConnector::new());
        let conn = connection(&connector);

        let err = conn.query("/system/resource").await.unwrap_err();
        assert_eq!(err, ConnectionError::NotConnected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_query_returns_session_rows() {
        let connector = Arc::new(ScriptedConnector::new());
        let mut row = Row::new();
        row.insert("cpu-load".into(), "7".into());
        connector.set_rows("/system/resource", vec![row]);
        let conn = connection(&connector);

        conn.connect().await.unwrap();
        let rows = conn.query("/system/resource").await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["cpu-load"], "7");
    }

    #[tokio::test]
    async fn test_credentials_file_is_presented_to_connector() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "username = \"filed\"\npassword = \"hunter2\"").unwrap();

        let connector = Arc::new(ScriptedConnector::new());
        let conn = Connection::new(
            ConnectionKey::new("r1.test", 8728).with_credentials_file(file.path()),
            connector.clone(),
            policy(),
        );

        conn.connect().await.unwrap();
        let creds = connector.last_credentials().unwrap();
        assert_eq!(creds.username.as_deref(), Some("filed"));
        assert_eq!(creds.password.as_deref(), Some("hunter2"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unreadable_credentials_count_as_failure() {
        let connector = Arc::new(ScriptedConnector::new());
        let conn = Connection::new(
            ConnectionKey::new("r1.test", 8728)
                .with_credentials_file("/nonexistent/fleetscrape/creds.toml"),
            connector.clone(),
            policy(),
        );

        let err = conn.connect().await.unwrap_err();
        assert!(matches!(err, ConnectionError::Credentials { .. }));
        assert_eq!(conn.successive_failures().await, 1);
        assert_eq!(connector.attempts("r1.test"), 0);
    }
}
