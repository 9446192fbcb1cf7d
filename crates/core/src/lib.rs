//! # atomdict core
//!
//! A concurrent keyed cache whose missing values are generated at most once
//! per key, with per-key locking so unrelated keys never wait on each other.
//!
//! This crate contains:
//! - [`AtomicDictionary`]: the cache coordinator
//! - [`LockRegistry`] and [`KeyToken`]: per-key mutual exclusion
//! - [`EntryKey`]: keys, with `None` mapped onto a reserved sentinel
//! - [`DictionaryConfig`] and its loaders
//! - [`DictionaryError`] and [`DictionaryStats`]
//!
//! ## Architecture Principles
//! - Only depends on `atomdict-common` for shared errors and lifecycle
//! - Blocking, thread-based; no async runtime
//! - Emits `tracing` events, never installs a subscriber

pub mod config;
pub mod dictionary;
pub mod error;
pub mod key;
pub mod registry;
pub mod stats;

pub use config::{DictionaryConfig, DictionaryConfigBuilder};
pub use dictionary::{AtomicDictionary, ExclusiveScope, Iter};
pub use error::{BoxError, DictionaryError, DictionaryResult};
pub use key::EntryKey;
pub use registry::{KeyGuard, KeyToken, LockRegistry};
pub use stats::DictionaryStats;
// Re-export the disposal contract so callers need only this crate
pub use atomdict_common::lifecycle::{DisposalNotification, HandlerId};
