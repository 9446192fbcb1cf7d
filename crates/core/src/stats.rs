//! Dictionary statistics
//!
//! Counters are plain relaxed atomics; a snapshot is not a consistent cut
//! across counters, only a cheap approximation for monitoring.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Point-in-time view of dictionary activity
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DictionaryStats {
    /// Values currently stored
    pub entries: usize,

    /// Key tokens currently registered
    pub tokens: usize,

    /// `get_or_add` calls answered from the cache
    pub hits: u64,

    /// `get_or_add` calls that had to take the key token
    pub misses: u64,

    /// Generator invocations that stored a value
    pub generations: u64,

    /// Generator invocations that failed
    pub generation_failures: u64,

    /// `remove` calls that dropped a value
    pub removals: u64,

    /// Whole-dictionary clears
    pub clears: u64,

    /// Bounded waits that expired
    pub lock_timeouts: u64,
}

impl DictionaryStats {
    /// Fraction of `get_or_add` calls served without generating
    pub fn hit_rate(&self) -> f64 {
        let total = self.total_lookups();
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    /// Total `get_or_add` calls (hits + misses)
    pub fn total_lookups(&self) -> u64 {
        self.hits + self.misses
    }
}

/// Lock-free counters behind [`DictionaryStats`]
///
/// Disabled collectors ignore every record call.
#[derive(Debug)]
pub(crate) struct StatsCollector {
    enabled: bool,
    hits: AtomicU64,
    misses: AtomicU64,
    generations: AtomicU64,
    generation_failures: AtomicU64,
    removals: AtomicU64,
    clears: AtomicU64,
    lock_timeouts: AtomicU64,
}

impl StatsCollector {
    pub(crate) fn new(enabled: bool) -> Self {
        Self {
            enabled,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            generations: AtomicU64::new(0),
            generation_failures: AtomicU64::new(0),
            removals: AtomicU64::new(0),
            clears: AtomicU64::new(0),
            lock_timeouts: AtomicU64::new(0),
        }
    }

    fn bump(&self, counter: &AtomicU64) {
        if self.enabled {
            counter.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn record_hit(&self) {
        self.bump(&self.hits);
    }

    pub(crate) fn record_miss(&self) {
        self.bump(&self.misses);
    }

    pub(crate) fn record_generation(&self) {
        self.bump(&self.generations);
    }

    pub(crate) fn record_generation_failure(&self) {
        self.bump(&self.generation_failures);
    }

    pub(crate) fn record_removal(&self) {
        self.bump(&self.removals);
    }

    pub(crate) fn record_clear(&self) {
        self.bump(&self.clears);
    }

    pub(crate) fn record_lock_timeout(&self) {
        self.bump(&self.lock_timeouts);
    }

    pub(crate) fn snapshot(&self, entries: usize, tokens: usize) -> DictionaryStats {
        DictionaryStats {
            entries,
            tokens,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            generations: self.generations.load(Ordering::Relaxed),
            generation_failures: self.generation_failures.load(Ordering::Relaxed),
            removals: self.removals.load(Ordering::Relaxed),
            clears: self.clears.load(Ordering::Relaxed),
            lock_timeouts: self.lock_timeouts.load(Ordering::Relaxed),
        }
    }
}
