//! Lifecycle management utilities
//!
//! - **[`disposal`]**: explicit teardown with after-dispose notification

pub mod disposal;

// Re-export commonly used types and traits for convenience
pub use disposal::{
    DisposalNotification, DisposalNotifier, DisposalState, DisposeHandler, HandlerId,
};
