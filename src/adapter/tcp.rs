//! TCP reachability connector.
//!
//! Opens a plain TCP connection to the device API port and keeps it as the
//! session. It proves the device is reachable and lets the scrape core run
//! end to end, but speaks no device protocol: every query fails with
//! [`ConnectionError::Protocol`].

use std::io::ErrorKind;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::task::noop_waker_ref;
use parking_lot::Mutex;
use tokio::io::{AsyncWriteExt, ReadBuf};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;

use crate::config::ConnectionConfig;
use crate::domain::{ConnectionKey, Credentials};
use crate::error::ConnectionError;
use crate::port::{Connector, DeviceSession, Row};

/// Connector that opens raw TCP sessions.
#[derive(Debug, Clone)]
pub struct TcpConnector {
    connect_timeout: Duration,
}

impl TcpConnector {
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }
}

impl From<&ConnectionConfig> for TcpConnector {
    fn from(config: &ConnectionConfig) -> Self {
        Self::new(config.connect_timeout())
    }
}

#[async_trait]
impl Connector for TcpConnector {
    async fn open(
        &self,
        key: &ConnectionKey,
        _credentials: &Credentials,
    ) -> Result<Arc<dyn DeviceSession>, ConnectionError> {
        let addr = (key.host(), key.port());
        let stream = match timeout(self.connect_timeout, TcpStream::connect(addr)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                return Err(ConnectionError::Refused {
                    host: key.host().to_string(),
                    port: key.port(),
                    reason: e.to_string(),
                })
            }
            Err(_) => {
                return Err(ConnectionError::Timeout {
                    host: key.host().to_string(),
                    port: key.port(),
                    timeout_secs: self.connect_timeout.as_secs(),
                })
            }
        };

        if key.tls().use_ssl {
            debug!(connection = %key, "TLS requested; reachability session stays plain TCP");
        }
        Ok(Arc::new(TcpSession {
            stream: Mutex::new(Some(stream)),
        }))
    }
}

/// A raw TCP session. Alive until closed or the peer hangs up.
pub struct TcpSession {
    stream: Mutex<Option<TcpStream>>,
}

#[async_trait]
impl DeviceSession for TcpSession {
    fn is_alive(&self) -> bool {
        let guard = self.stream.lock();
        let Some(stream) = guard.as_ref() else {
            return false;
        };
        // Peek so buffered device data stays unread. EOF means the peer
        // closed; Pending means idle.
        let mut peeked = [0u8; 1];
        let mut buf = ReadBuf::new(&mut peeked);
        let mut cx = Context::from_waker(noop_waker_ref());
        match stream.poll_peek(&mut cx, &mut buf) {
            Poll::Pending => true,
            Poll::Ready(Ok(0)) => false,
            Poll::Ready(Ok(_)) => true,
            Poll::Ready(Err(e)) => e.kind() == ErrorKind::WouldBlock,
        }
    }

    async fn query(&self, path: &str) -> Result<Vec<Row>, ConnectionError> {
        if self.stream.lock().is_none() {
            return Err(ConnectionError::NotConnected);
        }
        Err(ConnectionError::Protocol(format!(
            "{path}: the TCP connector checks reachability only"
        )))
    }

    async fn close(&self) -> Result<(), ConnectionError> {
        let stream = self.stream.lock().take();
        if let Some(mut stream) = stream {
            stream
                .shutdown()
                .await
                .map_err(|e| ConnectionError::Protocol(e.to_string()))?;
        }
        Ok(())
    }
}
