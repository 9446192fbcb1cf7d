//! Keyed cache with per-key generation locks
//!
//! [`AtomicDictionary`] guarantees that for any key at most one generator
//! runs per epoch, while operations on different keys proceed in parallel.
//!
//! # Locking
//!
//! Three layers cooperate:
//!
//! 1. A fair global `RwLock<()>` barrier. Per-key operations hold it shared;
//!    [`ExclusiveScope`], [`AtomicDictionary::clear`] and disposal hold it
//!    exclusively.
//! 2. One [`KeyToken`] per key from the [`LockRegistry`]. Generation and
//!    removal for a key happen while its token is held.
//! 3. The sharded maps themselves, whose shard locks are only ever held for
//!    a single map call.
//!
//! Locks are taken in that order and never in reverse. A generator may call
//! back into the dictionary for other keys: a thread that already holds the
//! barrier shared re-enters it recursively, so a queued writer cannot wedge
//! between the outer and the nested read. Locks are otherwise not reentrant.
//! A thread that holds a key's token (through
//! [`AtomicDictionary::lock_handle_for`] or as a running generator) must not
//! call back in for that same key, and neither a generator nor a holder of an
//! [`ExclusiveScope`] may call whole-dictionary operations.
//!
//! # Example
//! ```
//! use atomdict_core::AtomicDictionary;
//!
//! let users: AtomicDictionary<String> = AtomicDictionary::new();
//! let name = users.get_or_add(Some("42"), |key| format!("user-{}", key.unwrap_or("anon")))?;
//! assert_eq!(name, "user-42");
//!
//! // A second call is answered from the cache; the generator does not run.
//! let again = users.get_or_add(Some("42"), |_| unreachable!())?;
//! assert_eq!(again, "user-42");
//! # Ok::<(), atomdict_core::DictionaryError>(())
//! ```

use std::cell::Cell;
use std::convert::Infallible;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use atomdict_common::lifecycle::{
    DisposalNotification, DisposalNotifier, DisposeHandler, HandlerId,
};
use dashmap::DashMap;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, trace, warn};

use crate::config::DictionaryConfig;
use crate::error::{BoxError, DictionaryError, DictionaryResult};
use crate::key::{normalize, EntryKey};
use crate::registry::{KeyGuard, KeyToken, LockRegistry};
use crate::stats::{DictionaryStats, StatsCollector};

const GLOBAL_BARRIER: &str = "global_barrier";
const KEY_TOKEN: &str = "key_token";
const NULL_LABEL: &str = "<null>";
const ALL_KEYS_LABEL: &str = "*";

thread_local! {
    // Shared barrier holds on this thread, across all dictionaries.
    static SHARED_DEPTH: Cell<usize> = const { Cell::new(0) };
}

/// Shared hold on the global barrier, counted in `SHARED_DEPTH`
struct SharedBarrier<'a> {
    _guard: RwLockReadGuard<'a, ()>,
}

impl<'a> SharedBarrier<'a> {
    fn new(guard: RwLockReadGuard<'a, ()>) -> Self {
        SHARED_DEPTH.with(|depth| depth.set(depth.get() + 1));
        Self { _guard: guard }
    }

    fn held_on_this_thread() -> bool {
        SHARED_DEPTH.with(Cell::get) > 0
    }
}

impl Drop for SharedBarrier<'_> {
    fn drop(&mut self) {
        SHARED_DEPTH.with(|depth| depth.set(depth.get().saturating_sub(1)));
    }
}

fn key_label(key: Option<&str>) -> &str {
    key.unwrap_or(NULL_LABEL)
}

/// Concurrent keyed cache that generates each missing value at most once
///
/// Values are cloned out on every read, so `T` is typically an `Arc<_>` or
/// another cheaply cloneable handle.
pub struct AtomicDictionary<T> {
    items: DashMap<EntryKey, T>,
    registry: LockRegistry,
    barrier: RwLock<()>,
    config: DictionaryConfig,
    stats: StatsCollector,
    disposed: AtomicBool,
    notifier: DisposalNotifier,
}

impl<T: Clone> AtomicDictionary<T> {
    /// Empty dictionary with the default configuration
    pub fn new() -> Self {
        Self::build(DictionaryConfig::default())
    }

    /// Empty dictionary with a custom configuration
    ///
    /// # Errors
    /// Returns `DictionaryError::Common` if the configuration is invalid.
    pub fn with_config(config: DictionaryConfig) -> DictionaryResult<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: DictionaryConfig) -> Self {
        let (items, registry) = match config.shard_amount {
            Some(shards) => {
                (DashMap::with_shard_amount(shards), LockRegistry::with_shard_amount(shards))
            }
            None => (DashMap::new(), LockRegistry::new()),
        };

        Self {
            items,
            registry,
            barrier: RwLock::new(()),
            stats: StatsCollector::new(config.track_stats),
            config,
            disposed: AtomicBool::new(false),
            notifier: DisposalNotifier::new(),
        }
    }

    /// The value for `key`, generating and storing it if absent
    ///
    /// `generate` receives the caller's key (`None` for the null key) and
    /// runs at most once per key per epoch, even when many threads race on
    /// the same missing key. Losers of the race block on the key's token and
    /// then return the winner's value.
    ///
    /// # Errors
    /// - `DictionaryError::Disposed` after [`dispose`](Self::dispose)
    /// - `DictionaryError::LockTimeout` when a configured wait expires
    pub fn get_or_add<F>(&self, key: Option<&str>, generate: F) -> DictionaryResult<T>
    where
        F: FnOnce(Option<&str>) -> T,
    {
        self.try_get_or_add(key, |key| Ok::<T, Infallible>(generate(key)))
    }

    /// Like [`get_or_add`](Self::get_or_add) with a fallible generator
    ///
    /// When `generate` fails nothing is stored and the token is released, so
    /// a later call generates again. With `retire_tokens_on_failure` the
    /// token is also dropped if no other caller is waiting on it.
    ///
    /// # Errors
    /// - `DictionaryError::Generation` carrying the generator's error
    /// - `DictionaryError::Disposed` after [`dispose`](Self::dispose)
    /// - `DictionaryError::LockTimeout` when a configured wait expires
    pub fn try_get_or_add<F, E>(&self, key: Option<&str>, generate: F) -> DictionaryResult<T>
    where
        F: FnOnce(Option<&str>) -> Result<T, E>,
        E: Into<BoxError>,
    {
        let raw = normalize(key);
        let _shared = self.shared_barrier(key_label(key))?;

        if let Some(value) = self.lookup(raw) {
            self.stats.record_hit();
            return Ok(value);
        }
        self.stats.record_miss();

        let entry_key = EntryKey::new(key);
        loop {
            let token = self.registry.token_for(&entry_key);
            let held = self.acquire_token(&token, key_label(key))?;

            // Retired while we waited: the next token_for starts a new epoch.
            if !self.registry.is_current(raw, &token) {
                trace!(key = key_label(key), "atomic_dictionary.stale_token");
                continue;
            }

            if let Some(value) = self.lookup(raw) {
                return Ok(value);
            }

            match generate(key) {
                Ok(value) => {
                    self.items.insert(entry_key, value.clone());
                    self.stats.record_generation();
                    trace!(key = key_label(key), "atomic_dictionary.value_generated");
                    return Ok(value);
                }
                Err(source) => {
                    let source: BoxError = source.into();
                    drop(held);
                    self.stats.record_generation_failure();
                    warn!(
                        key = key_label(key),
                        error = %source,
                        "atomic_dictionary.generation_failed"
                    );

                    if self.config.retire_tokens_on_failure {
                        self.registry.retire_if_idle(raw, &token);
                    }
                    return Err(DictionaryError::generation(key_label(key).to_string(), source));
                }
            }
        }
    }

    /// The token that guards generation and removal of `key`
    ///
    /// The token is created if absent but not acquired. Locking it excludes
    /// `get_or_add` and `remove` for this key until the guard drops.
    ///
    /// # Errors
    /// - `DictionaryError::Disposed` after [`dispose`](Self::dispose)
    /// - `DictionaryError::LockTimeout` when the barrier wait expires
    pub fn lock_handle_for(&self, key: Option<&str>) -> DictionaryResult<KeyToken> {
        let _shared = self.shared_barrier(key_label(key))?;
        Ok(self.registry.token_for(&EntryKey::new(key)))
    }

    /// Remove `key` and its token, returning the value if there was one
    ///
    /// Waits for any in-flight generation of `key` to finish first. The next
    /// `get_or_add` for the key starts a new epoch and generates again.
    ///
    /// # Errors
    /// - `DictionaryError::Disposed` after [`dispose`](Self::dispose)
    /// - `DictionaryError::LockTimeout` when a configured wait expires
    pub fn remove(&self, key: Option<&str>) -> DictionaryResult<Option<T>> {
        let raw = normalize(key);
        let _shared = self.shared_barrier(key_label(key))?;

        let removed = loop {
            let Some(token) = self.registry.get(raw) else {
                break self.items.remove(raw).map(|(_, value)| value);
            };

            let held = self.acquire_token(&token, key_label(key))?;
            if !self.registry.is_current(raw, &token) {
                continue;
            }

            self.registry.retire(raw);
            let removed = self.items.remove(raw).map(|(_, value)| value);
            drop(held);
            break removed;
        };

        if removed.is_some() {
            self.stats.record_removal();
            debug!(key = key_label(key), "atomic_dictionary.removed");
        }
        Ok(removed)
    }

    /// Drop every value and every token
    ///
    /// Takes the barrier exclusively, so it waits for in-flight per-key
    /// operations and blocks new ones until done. Use
    /// [`ExclusiveScope::clear`] when a scope is already held.
    ///
    /// # Errors
    /// - `DictionaryError::Disposed` after [`dispose`](Self::dispose)
    /// - `DictionaryError::LockTimeout` when the barrier wait expires
    pub fn clear(&self) -> DictionaryResult<()> {
        self.exclusive_scope()?.clear();
        Ok(())
    }

    /// Hold the barrier exclusively until the returned scope drops
    ///
    /// # Errors
    /// - `DictionaryError::Disposed` after [`dispose`](Self::dispose)
    /// - `DictionaryError::LockTimeout` when the barrier wait expires
    pub fn exclusive_scope(&self) -> DictionaryResult<ExclusiveScope<'_, T>> {
        let guard = match self.config.lock_timeout {
            Some(timeout) => self
                .barrier
                .try_write_for(timeout)
                .ok_or_else(|| self.timed_out(GLOBAL_BARRIER, ALL_KEYS_LABEL, timeout))?,
            None => self.barrier.write(),
        };
        self.ensure_live()?;

        trace!("atomic_dictionary.exclusive_acquired");
        Ok(ExclusiveScope { dictionary: self, _guard: guard })
    }

    /// Lazy sequence over the entries present when it was created
    ///
    /// Keys are captured up front and values are read as the iterator
    /// advances: entries removed meanwhile are skipped and replaced values
    /// may be observed. No dictionary lock is held between calls to `next`,
    /// so the consuming thread may modify the dictionary while iterating.
    pub fn iter(&self) -> Iter<'_, T> {
        let keys: Vec<EntryKey> = self.items.iter().map(|entry| entry.key().clone()).collect();
        Iter { items: &self.items, keys: keys.into_iter() }
    }

    /// Collect the current values; same consistency as [`iter`](Self::iter)
    pub fn values(&self) -> Vec<T> {
        self.iter().map(|(_, value)| value).collect()
    }

    /// Plain lookup; never generates and takes no dictionary lock
    pub fn get(&self, key: Option<&str>) -> Option<T> {
        self.lookup(normalize(key))
    }

    /// Whether a value is stored for `key`
    pub fn contains_key(&self, key: Option<&str>) -> bool {
        self.items.contains_key(normalize(key))
    }

    /// Number of stored values
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether no values are stored
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of registered key tokens
    pub fn token_count(&self) -> usize {
        self.registry.len()
    }

    /// Retire tokens that guard no value and that no caller holds
    ///
    /// Runs under the exclusive barrier. Returns the number retired.
    ///
    /// # Errors
    /// - `DictionaryError::Disposed` after [`dispose`](Self::dispose)
    /// - `DictionaryError::LockTimeout` when the barrier wait expires
    pub fn prune_tokens(&self) -> DictionaryResult<usize> {
        Ok(self.exclusive_scope()?.prune_tokens())
    }

    /// Snapshot of the activity counters
    pub fn stats(&self) -> DictionaryStats {
        self.stats.snapshot(self.items.len(), self.registry.len())
    }

    /// The configuration this dictionary was built with
    pub fn config(&self) -> &DictionaryConfig {
        &self.config
    }

    /// Tear the dictionary down and notify after-dispose handlers
    ///
    /// Waits for the exclusive barrier, drops every value and token, then
    /// runs the registered handlers once, after the barrier is released.
    /// Every later fallible operation returns `DictionaryError::Disposed`.
    /// Returns `false` if disposal had already started.
    ///
    /// Must not be called while holding an [`ExclusiveScope`].
    pub fn dispose(&self) -> bool {
        self.notifier.dispose(|| {
            let _exclusive = self.barrier.write();
            self.disposed.store(true, Ordering::Release);

            let entries = self.items.len();
            let tokens = self.registry.len();
            self.items.clear();
            self.registry.clear();
            debug!(entries, tokens, "atomic_dictionary.disposed");
        })
    }

    fn lookup(&self, raw: &str) -> Option<T> {
        self.items.get(raw).map(|value| value.value().clone())
    }

    /// Take the barrier shared
    ///
    /// A nested hold skips the fair queue: behind a waiting writer a fair
    /// read would wait for a writer that waits for our outer read.
    fn shared_barrier(&self, key: &str) -> DictionaryResult<SharedBarrier<'_>> {
        let nested = SharedBarrier::held_on_this_thread();
        let guard = match (self.config.lock_timeout, nested) {
            (Some(timeout), false) => self
                .barrier
                .try_read_for(timeout)
                .ok_or_else(|| self.timed_out(GLOBAL_BARRIER, key, timeout))?,
            (Some(timeout), true) => self
                .barrier
                .try_read_recursive_for(timeout)
                .ok_or_else(|| self.timed_out(GLOBAL_BARRIER, key, timeout))?,
            (None, false) => self.barrier.read(),
            (None, true) => self.barrier.read_recursive(),
        };
        if nested {
            trace!(key, "atomic_dictionary.barrier_reentered");
        }

        let shared = SharedBarrier::new(guard);
        self.ensure_live()?;
        Ok(shared)
    }

    fn acquire_token<'t>(&self, token: &'t KeyToken, key: &str) -> DictionaryResult<KeyGuard<'t>> {
        match self.config.lock_timeout {
            Some(timeout) => {
                token.try_lock_for(timeout).ok_or_else(|| self.timed_out(KEY_TOKEN, key, timeout))
            }
            None => Ok(token.lock()),
        }
    }

    fn ensure_live(&self) -> DictionaryResult<()> {
        if self.disposed.load(Ordering::Acquire) {
            return Err(DictionaryError::Disposed);
        }
        Ok(())
    }

    fn timed_out(&self, lock: &'static str, key: &str, waited: Duration) -> DictionaryError {
        self.stats.record_lock_timeout();
        warn!(lock, key, ?waited, "atomic_dictionary.lock_timeout");
        DictionaryError::lock_timeout(lock, key.to_string(), waited)
    }
}

impl<T: Clone> Default for AtomicDictionary<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for AtomicDictionary<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AtomicDictionary")
            .field("entries", &self.items.len())
            .field("tokens", &self.registry.len())
            .field("config", &self.config)
            .field("disposed", &self.disposed.load(Ordering::Relaxed))
            .finish()
    }
}

impl<T> DisposalNotification for AtomicDictionary<T> {
    fn add_after_dispose_handler(&self, handler: DisposeHandler) -> HandlerId {
        self.notifier.add_after_dispose_handler(handler)
    }

    fn remove_after_dispose_handler(&self, id: HandlerId) -> bool {
        self.notifier.remove_after_dispose_handler(id)
    }

    fn was_disposed(&self) -> bool {
        self.notifier.was_disposed()
    }
}

impl<'a, T: Clone> IntoIterator for &'a AtomicDictionary<T> {
    type Item = (EntryKey, T);
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Exclusive hold on the whole dictionary
///
/// Per-key operations, `clear` and other scopes block until this drops.
/// Only the scope's own methods may be used while it is held.
#[must_use = "the exclusive barrier is released as soon as the scope is dropped"]
pub struct ExclusiveScope<'a, T> {
    dictionary: &'a AtomicDictionary<T>,
    _guard: RwLockWriteGuard<'a, ()>,
}

impl<T: Clone> ExclusiveScope<'_, T> {
    /// Number of stored values
    pub fn len(&self) -> usize {
        self.dictionary.items.len()
    }

    /// Whether no values are stored
    pub fn is_empty(&self) -> bool {
        self.dictionary.items.is_empty()
    }

    /// Plain lookup
    pub fn get(&self, key: Option<&str>) -> Option<T> {
        self.dictionary.get(key)
    }

    /// Whether a value is stored for `key`
    pub fn contains_key(&self, key: Option<&str>) -> bool {
        self.dictionary.contains_key(key)
    }

    /// Every entry; consistent because no writer can run
    pub fn snapshot(&self) -> Vec<(EntryKey, T)> {
        self.dictionary
            .items
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    /// Every value
    pub fn values(&self) -> Vec<T> {
        self.dictionary.items.iter().map(|entry| entry.value().clone()).collect()
    }

    /// Number of registered key tokens
    pub fn token_count(&self) -> usize {
        self.dictionary.registry.len()
    }

    /// Drop every value and every token
    pub fn clear(&self) {
        let entries = self.dictionary.items.len();
        self.dictionary.items.clear();
        self.dictionary.registry.clear();
        self.dictionary.stats.record_clear();
        debug!(entries, "atomic_dictionary.cleared");
    }

    /// Retire tokens that guard no value and that no caller holds
    pub fn prune_tokens(&self) -> usize {
        let items = &self.dictionary.items;
        let pruned = self.dictionary.registry.prune_idle(|key| items.contains_key(key));
        debug!(pruned, "atomic_dictionary.tokens_pruned");
        pruned
    }
}

impl<T> Drop for ExclusiveScope<'_, T> {
    fn drop(&mut self) {
        trace!("atomic_dictionary.exclusive_released");
    }
}

impl<T> fmt::Debug for ExclusiveScope<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExclusiveScope").field("entries", &self.dictionary.items.len()).finish()
    }
}

/// Iterator returned by [`AtomicDictionary::iter`]
pub struct Iter<'a, T> {
    items: &'a DashMap<EntryKey, T>,
    keys: std::vec::IntoIter<EntryKey>,
}

impl<T: Clone> Iterator for Iter<'_, T> {
    type Item = (EntryKey, T);

    fn next(&mut self) -> Option<Self::Item> {
        for key in self.keys.by_ref() {
            let value = self.items.get(&key).map(|value| value.value().clone());
            if let Some(value) = value {
                return Some((key, value));
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.keys.len()))
    }
}

impl<T> fmt::Debug for Iter<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Iter").field("remaining", &self.keys.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    /// Validates the basic get-or-add flow.
    ///
    /// Assertions:
    /// - Confirms the first call generates and the second hits the cache.
    /// - Confirms hit/miss/generation counters.
    #[test]
    fn test_get_or_add_generates_once() {
        let dict: AtomicDictionary<u32> = AtomicDictionary::new();
        assert_eq!(dict.get_or_add(Some("a"), |_| 1).unwrap(), 1);
        assert_eq!(dict.get_or_add(Some("a"), |_| 2).unwrap(), 1);

        let stats = dict.stats();
        assert_eq!(stats.generations, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.entries, 1);
        assert_eq!(stats.tokens, 1);
    }

    /// Validates the generator sees the caller's key.
    ///
    /// Assertions:
    /// - Confirms `Some(key)` and `None` are passed through unchanged.
    #[test]
    fn test_generator_receives_original_key() {
        let dict: AtomicDictionary<String> = AtomicDictionary::new();
        let named = dict.get_or_add(Some("x"), |key| format!("{key:?}")).unwrap();
        let null = dict.get_or_add(None, |key| format!("{key:?}")).unwrap();
        assert_eq!(named, "Some(\"x\")");
        assert_eq!(null, "None");
    }

    /// Validates removal semantics.
    ///
    /// Assertions:
    /// - Confirms `remove` returns the value and retires the token.
    /// - Ensures removing again is a no-op.
    #[test]
    fn test_remove_returns_value_and_retires_token() {
        let dict: AtomicDictionary<u32> = AtomicDictionary::new();
        dict.get_or_add(Some("a"), |_| 7).unwrap();

        assert_eq!(dict.remove(Some("a")).unwrap(), Some(7));
        assert_eq!(dict.token_count(), 0);
        assert!(!dict.contains_key(Some("a")));
        assert_eq!(dict.remove(Some("a")).unwrap(), None);
        assert_eq!(dict.stats().removals, 1);
    }

    /// Validates failed generation.
    ///
    /// Assertions:
    /// - Ensures nothing is stored and the idle token is retired.
    /// - Confirms the next call generates again.
    #[test]
    fn test_failed_generation_stores_nothing() {
        let dict: AtomicDictionary<u32> = AtomicDictionary::new();
        let err = dict.try_get_or_add(Some("a"), |_| Err::<u32, _>("boom")).unwrap_err();
        assert!(matches!(err, DictionaryError::Generation { ref key, .. } if key == "a"));
        assert!(dict.get(Some("a")).is_none());
        assert_eq!(dict.token_count(), 0);

        assert_eq!(dict.try_get_or_add(Some("a"), |_| Ok::<_, BoxError>(3)).unwrap(), 3);
        assert_eq!(dict.stats().generation_failures, 1);
    }

    /// Validates that failed tokens can be kept.
    ///
    /// Assertions:
    /// - Ensures the token survives when retirement is disabled.
    #[test]
    fn test_failed_generation_keeps_token_when_configured() {
        let config = DictionaryConfig::builder().retire_tokens_on_failure(false).build().unwrap();
        let dict: AtomicDictionary<u32> = AtomicDictionary::with_config(config).unwrap();
        let _ = dict.try_get_or_add(Some("a"), |_| Err::<u32, _>("boom"));
        assert_eq!(dict.token_count(), 1);

        assert_eq!(dict.prune_tokens().unwrap(), 1);
        assert_eq!(dict.token_count(), 0);
    }

    /// Validates the exclusive scope view.
    ///
    /// Assertions:
    /// - Confirms `snapshot` and `values` see every entry.
    /// - Ensures `clear` through the scope empties both maps.
    #[test]
    fn test_exclusive_scope_view_and_clear() {
        let dict: AtomicDictionary<u32> = AtomicDictionary::new();
        dict.get_or_add(Some("a"), |_| 1).unwrap();
        dict.get_or_add(Some("b"), |_| 2).unwrap();

        {
            let scope = dict.exclusive_scope().unwrap();
            let mut snapshot = scope.snapshot();
            snapshot.sort();
            assert_eq!(snapshot, vec![(EntryKey::from("a"), 1), (EntryKey::from("b"), 2)]);
            assert_eq!(scope.token_count(), 2);
            scope.clear();
            assert!(scope.is_empty());
            assert_eq!(scope.token_count(), 0);
        }

        assert_eq!(dict.stats().clears, 1);
        assert_eq!(dict.get_or_add(Some("a"), |_| 10).unwrap(), 10);
    }

    /// Validates that an invalid configuration is refused.
    ///
    /// Assertions:
    /// - Ensures `with_config` reports a config validation error.
    #[test]
    fn test_with_config_validates() {
        let config = DictionaryConfig { shard_amount: Some(3), ..DictionaryConfig::default() };
        let result = AtomicDictionary::<u32>::with_config(config);
        assert!(matches!(result, Err(DictionaryError::Common(_))));
    }

    /// Validates that iteration tolerates mutation by the consumer.
    ///
    /// Assertions:
    /// - Ensures removing entries mid-iteration does not deadlock.
    /// - Confirms removed entries are skipped.
    #[test]
    fn test_iter_allows_mutation_while_iterating() {
        let dict: AtomicDictionary<Arc<u32>> = AtomicDictionary::new();
        for (i, key) in ["a", "b", "c"].into_iter().enumerate() {
            dict.get_or_add(Some(key), |_| Arc::new(i as u32)).unwrap();
        }

        let mut seen = 0;
        for (key, _) in &dict {
            seen += 1;
            for other in ["a", "b", "c"] {
                if Some(other) != key.as_str() {
                    dict.remove(Some(other)).unwrap();
                }
            }
        }
        assert_eq!(seen, 1);
        assert_eq!(dict.len(), 1);
    }

    /// Validates disposal.
    ///
    /// Assertions:
    /// - Ensures later operations fail with `Disposed`.
    /// - Confirms maps are empty and disposal reports completion.
    #[test]
    fn test_dispose_rejects_later_operations() {
        let dict: AtomicDictionary<u32> = AtomicDictionary::new();
        dict.get_or_add(Some("a"), |_| 1).unwrap();

        assert!(dict.dispose());
        assert!(!dict.dispose());
        assert!(dict.was_disposed());
        assert!(dict.is_empty());
        assert_eq!(dict.token_count(), 0);

        assert!(matches!(dict.get_or_add(Some("a"), |_| 1), Err(DictionaryError::Disposed)));
        assert!(matches!(dict.remove(Some("a")), Err(DictionaryError::Disposed)));
        assert!(matches!(dict.lock_handle_for(Some("a")), Err(DictionaryError::Disposed)));
        assert!(matches!(dict.clear(), Err(DictionaryError::Disposed)));
        assert!(matches!(dict.exclusive_scope(), Err(DictionaryError::Disposed)));
    }

    /// Validates that a waiter on a retired token moves to the new epoch.
    ///
    /// Assertions:
    /// - Ensures the generator runs once, under the replacement token.
    /// - Confirms the registry holds exactly the current token afterwards.
    #[test]
    fn test_waiter_on_retired_token_starts_new_epoch() {
        let dict: AtomicDictionary<u32> = AtomicDictionary::new();
        let calls = std::sync::atomic::AtomicUsize::new(0);
        let stale = dict.lock_handle_for(Some("k")).unwrap();

        std::thread::scope(|s| {
            let guard = stale.lock();
            let waiter = s.spawn(|| {
                dict.get_or_add(Some("k"), |_| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    5
                })
            });

            std::thread::sleep(Duration::from_millis(50));
            dict.registry.retire("k");
            drop(guard);
            assert_eq!(waiter.join().unwrap().unwrap(), 5);
        });

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(dict.token_count(), 1);
        let current = dict.lock_handle_for(Some("k")).unwrap();
        assert!(!current.same_token(&stale));
        assert!(dict.registry.is_current("k", &current));
    }

    /// Validates the per-thread barrier depth.
    ///
    /// Assertions:
    /// - Confirms nested calls raise the depth and it returns to zero.
    /// - Ensures an early `Disposed` return still releases the count.
    #[test]
    fn test_shared_depth_unwinds() {
        let dict: AtomicDictionary<usize> = AtomicDictionary::new();
        let outer = dict
            .get_or_add(Some("outer"), |_| {
                let inner = dict.get_or_add(Some("inner"), |_| SHARED_DEPTH.with(Cell::get));
                inner.unwrap() * 10 + SHARED_DEPTH.with(Cell::get)
            })
            .unwrap();
        assert_eq!(outer, 21);
        assert!(!SharedBarrier::held_on_this_thread());

        dict.dispose();
        assert!(dict.get_or_add(Some("x"), |_| 0).is_err());
        assert!(!SharedBarrier::held_on_this_thread());
    }
}
