//! Testing utilities and helpers
//!
//! - **[`counters`]**: shared call counters for generator closures
//! - **[`sync_utils`]**: blocking "eventually" helpers for threaded tests
//!
//! ```rust
//! use std::time::Duration;
//!
//! use atomdict_common::testing::{wait_until, CallCounter};
//!
//! let calls = CallCounter::new();
//! let generator = calls.wrap(|n: u32| n + 1);
//! assert_eq!(generator(2), 3);
//! assert!(wait_until(Duration::from_millis(100), || calls.count() == 1));
//! ```

pub mod counters;
pub mod sync_utils;

pub use counters::CallCounter;
pub use sync_utils::wait_until;
