//! Cancellation handle threaded through to executors.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A cloneable cancellation handle passed into every executor.
///
/// The run loop never cancels it; cancellation is entirely up to the
/// caller (signal handlers, timeouts, tests). Clones share one state, so
/// cancelling any handle is observed by all of them.
#[derive(Debug, Clone, Default)]
pub struct RunContext {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    cancelled: AtomicBool,
}

impl RunContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }
}
