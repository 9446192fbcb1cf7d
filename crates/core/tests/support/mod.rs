//! Shared helpers for `atomdict-core` integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Barrier};
use std::thread;

use atomdict_common::{init_tracing, LoggingConfig};

/// Install a debug subscriber once; later calls are no-ops.
pub fn init_test_tracing() {
    let _ = init_tracing(&LoggingConfig { with_target: false, ..LoggingConfig::debug() });
}

/// Run `work` on `threads` threads released together by a barrier and
/// collect the results in thread order.
pub fn race<F, R>(threads: usize, work: F) -> Vec<R>
where
    F: Fn(usize) -> R + Send + Sync + 'static,
    R: Send + 'static,
{
    let work = Arc::new(work);
    let start = Arc::new(Barrier::new(threads));

    let handles: Vec<_> = (0..threads)
        .map(|index| {
            let work = Arc::clone(&work);
            let start = Arc::clone(&start);
            thread::spawn(move || {
                start.wait();
                work(index)
            })
        })
        .collect();

    handles.into_iter().map(|handle| handle.join().expect("racer panicked")).collect()
}
