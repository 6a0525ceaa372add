use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::Notify;

use crate::error::Error;

#[derive(Default)]
struct FutureState {
    completed: bool,
    error: Option<Error>,
}

/// A one-shot, thread-safe completion cell holding an optional error.
///
/// The first call to [`Future::complete`] wins; later calls are no-ops, matching
/// the idempotent-completion contract consumers rely on when a probe lifecycle
/// call finishes exactly once but may race the caller reading it.
#[derive(Clone)]
pub struct Future {
    inner: Arc<Mutex<FutureState>>,
}

impl Future {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FutureState::default())),
        }
    }

    /// Completes the future with `error` (`None` means success). Idempotent.
    pub fn complete(&self, error: Option<Error>) {
        let mut state = self.inner.lock().expect("future mutex poisoned");
        if !state.completed {
            state.completed = true;
            state.error = error;
        }
    }

    /// Returns `(completed, error)`.
    pub fn is_completed(&self) -> (bool, Option<Error>) {
        let state = self.inner.lock().expect("future mutex poisoned");
        (state.completed, state.error.clone())
    }
}

impl Default for Future {
    fn default() -> Self {
        Self::new()
    }
}

/// A counting async wait-group: producers `add`/`done`, any number of waiters
/// `wait` until the count returns to zero.
#[derive(Clone)]
pub struct WaitGroup {
    count: Arc<AtomicI64>,
    notify: Arc<Notify>,
}

impl WaitGroup {
    pub fn new() -> Self {
        Self {
            count: Arc::new(AtomicI64::new(0)),
            notify: Arc::new(Notify::new()),
        }
    }

    pub fn add(&self, delta: i64) {
        self.count.fetch_add(delta, Ordering::SeqCst);
    }

    pub fn done(&self) {
        let remaining = self.count.fetch_sub(1, Ordering::SeqCst) - 1;
        if remaining <= 0 {
            self.notify.notify_waiters();
        }
    }

    /// Registers as a notified listener before re-checking the count, not
    /// after: `done()` only wakes listeners already registered when it calls
    /// `notify_waiters()`, so checking the count first would let the last
    /// `done()` land in the gap between the check and the `.await` and hang
    /// the waiter forever.
    pub async fn wait(&self) {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.count.load(Ordering::SeqCst) <= 0 {
                return;
            }
            notified.await;
        }
    }
}

impl Default for WaitGroup {
    fn default() -> Self {
        Self::new()
    }
}
