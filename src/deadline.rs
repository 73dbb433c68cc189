//! One-shot, timer-armed cancellation signal.
//!
//! A [`DeadlineToken`] fires once its duration has elapsed, or when
//! [`fire`](DeadlineToken::fire) is called, and then stays fired. Disarming
//! a token that has not fired yet guarantees it never will.
//!
//! Tokens are cheap handles over shared state: clones observe and control
//! the same deadline. Waiters are woken by a background timer task, while
//! [`is_fired`](DeadlineToken::is_fired) also compares against the deadline
//! instant, so a checkpoint never misses an expiry the timer task has not
//! processed yet.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

struct Inner {
    token: CancellationToken,
    /// `None` once disarmed, or for tokens that only fire manually.
    deadline: Mutex<Option<Instant>>,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.get_mut().take() {
            timer.abort();
        }
    }
}

/// Cooperative deadline shared between a scheduler and its workers.
#[derive(Clone)]
pub struct DeadlineToken {
    inner: Arc<Inner>,
}

impl DeadlineToken {
    /// Arm a token that fires `after` from now.
    ///
    /// A deadline too far out to be represented never fires on its own and
    /// behaves like [`unarmed`](Self::unarmed). Must be called within a
    /// tokio runtime.
    pub fn arm(after: Duration) -> Self {
        let Some(deadline) = Instant::now().checked_add(after) else {
            return Self::unarmed();
        };
        let token = CancellationToken::new();

        let fire = token.clone();
        let timer = tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            fire.cancel();
        });

        Self {
            inner: Arc::new(Inner {
                token,
                deadline: Mutex::new(Some(deadline)),
                timer: Mutex::new(Some(timer)),
            }),
        }
    }

    /// A token with no timer. It fires only through [`fire`](Self::fire).
    pub fn unarmed() -> Self {
        Self {
            inner: Arc::new(Inner {
                token: CancellationToken::new(),
                deadline: Mutex::new(None),
                timer: Mutex::new(None),
            }),
        }
    }

    /// Whether the deadline has fired.
    pub fn is_fired(&self) -> bool {
        if self.inner.token.is_cancelled() {
            return true;
        }
        let expired = self
            .inner
            .deadline
            .lock()
            .is_some_and(|deadline| Instant::now() >= deadline);
        if expired {
            self.inner.token.cancel();
        }
        expired
    }

    /// Fire now. Idempotent.
    pub fn fire(&self) {
        self.inner.token.cancel();
        self.stop_timer();
    }

    /// Cancel the timer. A token that already fired stays fired; one that
    /// had not fired never will unless [`fire`](Self::fire) is called.
    pub fn disarm(&self) {
        // Settle an expiry the timer task has not delivered yet.
        self.is_fired();
        self.inner.deadline.lock().take();
        self.stop_timer();
    }

    /// Time left before firing; `None` when fired or disarmed.
    pub fn remaining(&self) -> Option<Duration> {
        if self.inner.token.is_cancelled() {
            return None;
        }
        let deadline = (*self.inner.deadline.lock())?;
        let remaining = deadline.saturating_duration_since(Instant::now());
        (!remaining.is_zero()).then_some(remaining)
    }

    /// Resolve once the token fires.
    pub async fn fired(&self) {
        self.inner.token.cancelled().await;
    }

    fn stop_timer(&self) {
        if let Some(timer) = self.inner.timer.lock().take() {
            timer.abort();
        }
    }
}

impl std::fmt::Debug for DeadlineToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeadlineToken")
            .field("fired", &self.is_fired())
            .field("remaining", &self.remaining())
            .finish()
    }
}
