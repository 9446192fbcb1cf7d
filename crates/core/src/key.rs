//! Entry keys and the null-key sentinel
//!
//! Callers address entries with `Option<&str>`. `None` is folded onto a
//! sentinel string generated once per process, so the absent key flows
//! through exactly the same code path as any other key.

use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;
use uuid::Uuid;

static NULL_SENTINEL: Lazy<Arc<str>> =
    Lazy::new(|| Arc::from(format!("Null Replacement: {}", Uuid::new_v4())));

/// Raw lookup form of a caller key, without allocating
pub(crate) fn normalize(key: Option<&str>) -> &str {
    match key {
        Some(key) => key,
        None => NULL_SENTINEL.as_ref(),
    }
}

/// Cheaply cloneable dictionary key
///
/// Hashes and compares like its raw string, which lets the maps be queried
/// with a plain `&str`.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryKey(Arc<str>);

impl EntryKey {
    /// Normalise a caller key (`None` becomes the sentinel)
    pub fn new(key: Option<&str>) -> Self {
        match key {
            Some(key) => Self(Arc::from(key)),
            None => Self::null(),
        }
    }

    /// The sentinel key standing in for an absent key
    pub fn null() -> Self {
        Self(Arc::clone(&NULL_SENTINEL))
    }

    /// Whether this is the sentinel
    pub fn is_null(&self) -> bool {
        Arc::ptr_eq(&self.0, &NULL_SENTINEL) || *self.0 == **NULL_SENTINEL
    }

    /// The caller-visible key; `None` for the sentinel
    pub fn as_str(&self) -> Option<&str> {
        if self.is_null() {
            None
        } else {
            Some(&self.0)
        }
    }

    /// The stored form, sentinel included
    pub fn raw(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for EntryKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EntryKey {
    fn from(key: &str) -> Self {
        Self::new(Some(key))
    }
}

impl From<String> for EntryKey {
    fn from(key: String) -> Self {
        Self(Arc::from(key))
    }
}

impl From<Option<&str>> for EntryKey {
    fn from(key: Option<&str>) -> Self {
        Self::new(key)
    }
}

impl fmt::Display for EntryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_str() {
            Some(key) => f.write_str(key),
            None => f.write_str("<null>"),
        }
    }
}

impl fmt::Debug for EntryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_str() {
            Some(key) => write!(f, "EntryKey({key:?})"),
            None => f.write_str("EntryKey(<null>)"),
        }
    }
}
