//! After-dispose notification for explicitly torn-down components
//!
//! Components that own shared structures (such as a keyed dictionary) expose
//! an explicit teardown path instead of relying on `Drop`. Interested parties
//! register a handler and receive exactly one invocation once teardown has
//! completed.
//!
//! # Example
//! ```
//! use std::sync::atomic::{AtomicBool, Ordering};
//! use std::sync::Arc;
//!
//! use atomdict_common::lifecycle::{DisposalNotification, DisposalNotifier};
//!
//! let notifier = DisposalNotifier::new();
//! let fired = Arc::new(AtomicBool::new(false));
//! let flag = Arc::clone(&fired);
//! notifier.on_disposed(move || flag.store(true, Ordering::SeqCst));
//!
//! assert!(notifier.dispose(|| { /* release resources */ }));
//! assert!(notifier.was_disposed());
//! assert!(fired.load(Ordering::SeqCst));
//! ```

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tracing::{debug, trace, warn};

/// Callback invoked once after teardown completes
pub type DisposeHandler = Box<dyn FnOnce() + Send + 'static>;

/// Identifies a registered handler so it can be removed again
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

/// Teardown phase of a disposable component
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisposalState {
    /// Component is live
    Active,
    /// Teardown has started but not finished
    Disposing,
    /// Teardown finished and handlers were notified
    Disposed,
}

impl fmt::Display for DisposalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => write!(f, "Active"),
            Self::Disposing => write!(f, "Disposing"),
            Self::Disposed => write!(f, "Disposed"),
        }
    }
}

/// Contract for components that notify observers after teardown
pub trait DisposalNotification {
    /// Register a handler to run once after teardown completes
    ///
    /// If teardown already completed, the handler runs immediately on the
    /// calling thread.
    fn add_after_dispose_handler(&self, handler: DisposeHandler) -> HandlerId;

    /// Unregister a handler; returns `false` if it was unknown or already ran
    fn remove_after_dispose_handler(&self, id: HandlerId) -> bool;

    /// Whether teardown has completed
    fn was_disposed(&self) -> bool;
}

struct NotifierState {
    phase: DisposalState,
    handlers: Vec<(HandlerId, DisposeHandler)>,
}

/// Mutex-guarded `Active → Disposing → Disposed` state machine
pub struct DisposalNotifier {
    state: Mutex<NotifierState>,
    next_id: AtomicU64,
}

impl fmt::Debug for DisposalNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("DisposalNotifier")
            .field("phase", &state.phase)
            .field("handlers", &state.handlers.len())
            .finish()
    }
}

impl Default for DisposalNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl DisposalNotifier {
    /// Create a notifier in the `Active` phase
    pub fn new() -> Self {
        Self {
            state: Mutex::new(NotifierState { phase: DisposalState::Active, handlers: Vec::new() }),
            next_id: AtomicU64::new(1),
        }
    }

    /// Current teardown phase
    pub fn state(&self) -> DisposalState {
        self.state.lock().phase
    }

    /// Number of handlers still waiting for teardown
    pub fn pending_handlers(&self) -> usize {
        self.state.lock().handlers.len()
    }

    /// Register a closure to run after teardown
    pub fn on_disposed<F>(&self, handler: F) -> HandlerId
    where
        F: FnOnce() + Send + 'static,
    {
        self.add_after_dispose_handler(Box::new(handler))
    }

    /// Run `teardown` once, then notify every registered handler
    ///
    /// Returns `false` without running `teardown` when another caller already
    /// started disposal. Handlers run outside the internal lock, so they may
    /// call back into the notifier. A panicking handler is logged and the
    /// remaining handlers still run.
    pub fn dispose<F>(&self, teardown: F) -> bool
    where
        F: FnOnce(),
    {
        {
            let mut state = self.state.lock();
            if state.phase != DisposalState::Active {
                trace!(phase = %state.phase, "disposal.already_started");
                return false;
            }
            state.phase = DisposalState::Disposing;
        }

        teardown();

        let handlers = {
            let mut state = self.state.lock();
            state.phase = DisposalState::Disposed;
            std::mem::take(&mut state.handlers)
        };

        debug!(handler_count = handlers.len(), "disposal.completed");

        for (id, handler) in handlers {
            invoke(id, handler);
        }
        true
    }
}

/// Run one handler; a panic is logged and does not reach later handlers
///
/// Builds with `panic = "abort"` still abort on a handler panic.
fn invoke(id: HandlerId, handler: DisposeHandler) {
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(handler)) {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        warn!(handler = id.0, panic = %message, "disposal.handler_panicked");
    }
}

impl DisposalNotification for DisposalNotifier {
    fn add_after_dispose_handler(&self, handler: DisposeHandler) -> HandlerId {
        let id = HandlerId(self.next_id.fetch_add(1, Ordering::Relaxed));

        let mut state = self.state.lock();
        if state.phase == DisposalState::Disposed {
            drop(state);
            trace!(handler = id.0, "disposal.handler_invoked_late");
            invoke(id, handler);
            return id;
        }
        state.handlers.push((id, handler));
        id
    }

    fn remove_after_dispose_handler(&self, id: HandlerId) -> bool {
        let mut state = self.state.lock();
        let before = state.handlers.len();
        state.handlers.retain(|(registered, _)| *registered != id);
        state.handlers.len() != before
    }

    fn was_disposed(&self) -> bool {
        self.state.lock().phase == DisposalState::Disposed
    }
}
