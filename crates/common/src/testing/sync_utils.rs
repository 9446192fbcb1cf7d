//! Blocking helpers for threaded tests

// Test helpers are self-explanatory; panics are the assertion mechanism.
#![allow(clippy::missing_panics_doc)]

use std::thread;
use std::time::{Duration, Instant};

/// Poll `predicate` until it returns true or `timeout` elapses
///
/// Returns whether the predicate became true.
pub fn wait_until<F>(timeout: Duration, mut predicate: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = Instant::now() + timeout;
    loop {
        if predicate() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        thread::sleep(Duration::from_millis(2));
    }
}

/// Assert that a condition eventually becomes true within a timeout
///
/// ```rust
/// use std::time::Duration;
///
/// atomdict_common::assert_eventually!(Duration::from_millis(50), || true);
/// ```
#[macro_export]
macro_rules! assert_eventually {
    ($timeout:expr, $predicate:expr) => {{
        let timeout_duration = $timeout;
        assert!(
            $crate::testing::wait_until(timeout_duration, $predicate),
            "Condition did not become true within {:?}",
            timeout_duration
        );
    }};
}
