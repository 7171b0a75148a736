//! Per-slot request scheduling: trailing-edge debounce timers and
//! latest-wins sequence numbers.

use std::{
    future::Future,
    sync::{
        atomic::{AtomicU64, Ordering},
        Mutex, PoisonError,
    },
    time::Duration,
};

use tokio::task::JoinHandle;

/// Trailing-edge debouncer owning the pending timer for one slot.
///
/// Arming replaces (and aborts) the pending timer. Once a timer fires its
/// action runs as a separate task, so re-arming never cancels a request that
/// has already been dispatched.
#[derive(Debug)]
pub struct Debouncer {
    wait: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl Debouncer {
    pub fn new(wait: Duration) -> Self {
        Self {
            wait,
            pending: Mutex::new(None),
        }
    }

    pub fn wait(&self) -> Duration {
        self.wait
    }

    /// Schedules `action` to run `wait` after the latest call.
    ///
    /// Must be called from within a tokio runtime.
    pub fn arm<F>(&self, action: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        // Held across the spawn: the stored timer is always the newest one.
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        let wait = self.wait;
        let timer = tokio::spawn(async move {
            tokio::time::sleep(wait).await;
            tokio::spawn(action);
        });
        if let Some(previous) = pending.replace(timer) {
            previous.abort();
        }
    }

    /// Drops the pending timer, if any, without running its action.
    pub fn cancel(&self) {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = pending.take() {
            previous.abort();
        }
    }

    pub fn is_pending(&self) -> bool {
        let pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        pending.as_ref().is_some_and(|timer| !timer.is_finished())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Monotonic request numbering for one slot.
#[derive(Debug, Default)]
pub struct RequestSequence {
    issued: AtomicU64,
}

impl RequestSequence {
    pub fn next(&self) -> u64 {
        self.issued.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Whether `seq` is still the most recently dispatched request.
    pub fn is_latest(&self, seq: u64) -> bool {
        self.issued.load(Ordering::SeqCst) == seq
    }
}
