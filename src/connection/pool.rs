//! Connection pool for probe queries.
//!
//! Caches [`Connection`]s by [`ConnectionKey`] so one-off probes against the
//! same device reuse a live session across requests.
//!
//! # Design
//!
//! The pool caches; it does not lease. It never tracks whether a connection
//! is in use and relies on callers not to drive the same key from two places
//! at once.
//!
//! Every lookup first sweeps entries idle for longer than the TTL, then
//! either refreshes a hit or inserts a fresh, not-yet-connected connection,
//! evicting the least-recently-used entry when the pool is full.
//!
//! A single `parking_lot::Mutex` guards the map. Evicted connections are
//! extracted under the lock and disconnected after it is released, so device
//! I/O never happens while the pool is locked and a slow or failing
//! disconnect cannot corrupt pool bookkeeping.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::{debug, info};

use super::{BackoffPolicy, Connection};
use crate::config::PoolConfig;
use crate::domain::ConnectionKey;
use crate::port::Connector;

/// Runtime statistics for the pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Connections currently cached.
    pub size: usize,
    /// Lookups that returned a cached connection.
    pub hits: u64,
    /// Lookups that created a new connection.
    pub misses: u64,
    /// Connections evicted by TTL or capacity.
    pub evictions: u64,
}

#[derive(Debug, Clone, Copy)]
enum EvictionReason {
    Expired,
    Capacity,
}

struct PoolEntry {
    connection: Arc<Connection>,
    last_used: Instant,
    /// Breaks `last_used` ties so LRU order is total.
    use_seq: u64,
}

struct PoolState {
    entries: HashMap<ConnectionKey, PoolEntry>,
    next_seq: u64,
}

impl PoolState {
    fn touch(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }
}

/// TTL and capacity bounded cache of device connections.
pub struct ConnectionPool {
    max_size: usize,
    ttl: Duration,
    connector: Arc<dyn Connector>,
    backoff: BackoffPolicy,
    state: Mutex<PoolState>,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl ConnectionPool {
    /// Create an empty pool. `max_size` is clamped to at least one.
    pub fn new(config: &PoolConfig, connector: Arc<dyn Connector>, backoff: BackoffPolicy) -> Self {
        Self {
            max_size: config.max_size.max(1),
            ttl: config.ttl(),
            connector,
            backoff,
            state: Mutex::new(PoolState {
                entries: HashMap::new(),
                next_seq: 0,
            }),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// Return the cached connection for `key`, creating one on a miss.
    ///
    /// Two calls with equal keys inside the TTL return the same `Arc`. The
    /// returned connection may not be connected yet.
    pub async fn get(&self, key: &ConnectionKey) -> Arc<Connection> {
        let now = Instant::now();

        let (connection, evicted) = {
            let mut state = self.state.lock();
            let mut evicted = Vec::new();

            let ttl = self.ttl;
            state.entries.retain(|key, entry| {
                if now.saturating_duration_since(entry.last_used) > ttl {
                    evicted.push((key.clone(), entry.connection.clone(), EvictionReason::Expired));
                    false
                } else {
                    true
                }
            });

            let seq = state.touch();
            let connection = if let Some(entry) = state.entries.get_mut(key) {
                entry.last_used = now;
                entry.use_seq = seq;
                self.hits.fetch_add(1, Ordering::Relaxed);
                entry.connection.clone()
            } else {
                self.misses.fetch_add(1, Ordering::Relaxed);

                if state.entries.len() >= self.max_size {
                    let lru = state
                        .entries
                        .iter()
                        .min_by_key(|(_, entry)| (entry.last_used, entry.use_seq))
                        .map(|(key, _)| key.clone());
                    if let Some(lru) = lru {
                        if let Some(entry) = state.entries.remove(&lru) {
                            evicted.push((lru, entry.connection, EvictionReason::Capacity));
                        }
                    }
                }

                let connection = Arc::new(Connection::new(
                    key.clone(),
                    self.connector.clone(),
                    self.backoff,
                ));
                state.entries.insert(
                    key.clone(),
                    PoolEntry {
                        connection: connection.clone(),
                        last_used: now,
                        use_seq: seq,
                    },
                );
                debug!(connection = %key, size = state.entries.len(), "Pooled new connection");
                connection
            };

            (connection, evicted)
        }; // lock released before any disconnect

        for (key, old, reason) in evicted {
            self.evictions.fetch_add(1, Ordering::Relaxed);
            debug!(connection = %key, reason = ?reason, "Evicting pooled connection");
            old.disconnect().await;
        }

        connection
    }

    /// Whether a live (non-expired) entry exists for `key`. Does not refresh it.
    pub fn contains(&self, key: &ConnectionKey) -> bool {
        let now = Instant::now();
        self.state
            .lock()
            .entries
            .get(key)
            .is_some_and(|entry| now.saturating_duration_since(entry.last_used) <= self.ttl)
    }

    /// Whether `connection` is still the cached instance for its key.
    ///
    /// False once it has been evicted or replaced, at which point the pool
    /// no longer closes it.
    pub fn holds(&self, connection: &Arc<Connection>) -> bool {
        self.state
            .lock()
            .entries
            .get(connection.key())
            .is_some_and(|entry| Arc::ptr_eq(&entry.connection, connection))
    }

    /// A connection built with the pool's connector and backoff but never
    /// cached. The caller owns it and must disconnect it.
    pub fn detached(&self, key: &ConnectionKey) -> Connection {
        Connection::new(key.clone(), self.connector.clone(), self.backoff)
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            size: self.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }

    /// Drop every cached connection, disconnecting each.
    pub async fn clear(&self) {
        let drained: Vec<_> = {
            let mut state = self.state.lock();
            state.entries.drain().map(|(_, entry)| entry.connection).collect()
        };
        if !drained.is_empty() {
            info!(connections = drained.len(), "Clearing connection pool");
        }
        for connection in drained {
            connection.disconnect().await;
        }
    }
}
