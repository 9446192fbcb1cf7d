//! Shared call counters

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Cheaply cloneable counter shared between a test and the closures it
/// hands out
#[derive(Debug, Clone, Default)]
pub struct CallCounter {
    calls: Arc<AtomicUsize>,
}

impl CallCounter {
    /// Counter starting at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one call and return the count before it
    pub fn hit(&self) -> usize {
        self.calls.fetch_add(1, Ordering::SeqCst)
    }

    /// Calls recorded so far
    pub fn count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Wrap a generator so each invocation is counted
    pub fn wrap<F, A, R>(&self, f: F) -> impl Fn(A) -> R + Send + Sync + 'static
    where
        F: Fn(A) -> R + Send + Sync + 'static,
    {
        let counter = self.clone();
        move |arg| {
            counter.hit();
            f(arg)
        }
    }
}
