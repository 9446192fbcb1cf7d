//! Per-key lock tokens
//!
//! The registry hands out one [`KeyToken`] per key. A token is created on
//! first reference and stays until the key is retired, so every caller that
//! touches the same key in the same epoch contends on the same mutex.
//! Tokens for different keys never interact.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use parking_lot::{Mutex, MutexGuard};
use tracing::trace;

use crate::key::EntryKey;

/// Identity-comparable per-key mutual exclusion handle
///
/// Clones share the same underlying mutex. Locking is not reentrant: a
/// thread holding a token must not lock it again.
#[derive(Clone, Default)]
pub struct KeyToken {
    inner: Arc<Mutex<()>>,
}

/// Exclusive possession of a [`KeyToken`]; released on drop
#[must_use = "the key lock is released as soon as the guard is dropped"]
pub struct KeyGuard<'a> {
    _guard: MutexGuard<'a, ()>,
}

impl KeyToken {
    fn new() -> Self {
        Self::default()
    }

    /// Block until the token is held
    pub fn lock(&self) -> KeyGuard<'_> {
        KeyGuard { _guard: self.inner.lock() }
    }

    /// Take the token if it is free right now
    pub fn try_lock(&self) -> Option<KeyGuard<'_>> {
        self.inner.try_lock().map(|guard| KeyGuard { _guard: guard })
    }

    /// Wait at most `timeout` for the token
    pub fn try_lock_for(&self, timeout: Duration) -> Option<KeyGuard<'_>> {
        self.inner.try_lock_for(timeout).map(|guard| KeyGuard { _guard: guard })
    }

    /// Whether some caller currently holds the token
    pub fn is_locked(&self) -> bool {
        self.inner.is_locked()
    }

    /// Whether both handles refer to the same token
    pub fn same_token(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Live handles to this token, the registry's own included
    fn holders(&self) -> usize {
        Arc::strong_count(&self.inner)
    }
}

impl fmt::Debug for KeyToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyToken")
            .field("id", &Arc::as_ptr(&self.inner))
            .field("locked", &self.is_locked())
            .finish()
    }
}

impl fmt::Debug for KeyGuard<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("KeyGuard")
    }
}

/// Concurrent map from key to [`KeyToken`]
#[derive(Debug, Default)]
pub struct LockRegistry {
    tokens: DashMap<EntryKey, KeyToken>,
}

impl LockRegistry {
    /// Empty registry with the default shard count
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty registry with an explicit shard count (power of two, > 1)
    pub fn with_shard_amount(shard_amount: usize) -> Self {
        Self { tokens: DashMap::with_shard_amount(shard_amount) }
    }

    /// The token for `key`, inserting a fresh one if none exists
    ///
    /// Insertion happens under the shard lock, so concurrent callers for the
    /// same key all observe the single winning token.
    pub fn token_for(&self, key: &EntryKey) -> KeyToken {
        if let Some(existing) = self.tokens.get(key.raw()) {
            return existing.value().clone();
        }

        self.tokens
            .entry(key.clone())
            .or_insert_with(|| {
                trace!(key = %key, "lock_registry.token_created");
                KeyToken::new()
            })
            .value()
            .clone()
    }

    /// The token for `key` if one exists; never creates
    pub fn get(&self, key: &str) -> Option<KeyToken> {
        self.tokens.get(key).map(|token| token.value().clone())
    }

    /// Whether `token` is still the registered token for `key`
    pub fn is_current(&self, key: &str, token: &KeyToken) -> bool {
        self.tokens.get(key).is_some_and(|current| current.value().same_token(token))
    }

    /// Drop the token for `key`; a no-op when there is none
    pub fn retire(&self, key: &str) -> bool {
        let retired = self.tokens.remove(key).is_some();
        if retired {
            trace!(key, "lock_registry.token_retired");
        }
        retired
    }

    /// Drop the token for `key` only if it is still `token` and nobody but
    /// the registry and the caller holds it
    ///
    /// The holder count is read under the shard write lock, and every clone
    /// handed out by [`token_for`](Self::token_for) is taken under the same
    /// lock, so a token cannot be retired while another caller obtained it.
    pub fn retire_if_idle(&self, key: &str, token: &KeyToken) -> bool {
        let retired = self
            .tokens
            .remove_if(key, |_, current| current.same_token(token) && current.holders() <= 2)
            .is_some();
        if retired {
            trace!(key, "lock_registry.idle_token_retired");
        }
        retired
    }

    /// Drop every token held only by the registry whose key `keep` rejects
    ///
    /// Returns the number of tokens dropped.
    pub fn prune_idle<F>(&self, keep: F) -> usize
    where
        F: Fn(&EntryKey) -> bool,
    {
        let mut pruned = 0;
        self.tokens.retain(|key, token| {
            let retain = token.holders() > 1 || keep(key);
            if !retain {
                pruned += 1;
            }
            retain
        });
        pruned
    }

    /// Whether a token exists for `key`
    pub fn contains(&self, key: &str) -> bool {
        self.tokens.contains_key(key)
    }

    /// Number of live tokens
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Whether no tokens exist
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Drop every token
    pub fn clear(&self) {
        self.tokens.clear();
    }
}
