//! Visitor-scoped key/value storage.
//!
//! The controller persists exactly one value, but the store abstraction is a
//! plain string key/value map so that it can be backed by anything that
//! behaves like browser local storage: durable across reloads, local to one
//! device, never synced.
//!
//! # Implementations
//!
//! - [`MemoryStore`]: in-process map, clones share state via `Arc`
//! - [`ChaoticStore`]: wraps another store and fails reads or writes on demand
//!   for fault-injection tests

use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicBool, Ordering},
    },
};

use thiserror::Error;

/// Errors from store operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Storage is disabled or inaccessible (private browsing, permissions).
    #[error("storage unavailable: {reason}")]
    Unavailable {
        /// Description of the failure.
        reason: String,
    },

    /// Storage is full.
    #[error("storage quota exceeded")]
    QuotaExceeded,

    /// Underlying I/O failed.
    #[error("storage I/O error: {reason}")]
    Io {
        /// Description of the failure.
        reason: String,
    },

    /// Backing data is unreadable as a store and will not recover by retrying.
    #[error("storage corrupt: {reason}")]
    Corrupt {
        /// Description of the failure.
        reason: String,
    },
}

impl StoreError {
    /// Returns true if retrying later might succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Io { .. } => true,
            Self::Unavailable { .. } | Self::QuotaExceeded | Self::Corrupt { .. } => false,
        }
    }
}

/// String key/value storage scoped to one visitor.
///
/// Each `set` replaces the whole value for a key atomically; readers never
/// observe a partially written value.
pub trait Store: Send + Sync {
    /// Read the value stored under `key`.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Replace the value stored under `key`.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Delete `key`. Deleting a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

impl<S: Store + ?Sized> Store for Arc<S> {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        (**self).remove(key)
    }
}

/// In-memory store.
///
/// Cloning shares the underlying map, so two controllers built over clones of
/// the same `MemoryStore` behave like two tabs over one browser profile.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether the store holds no keys.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Store for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key);
        Ok(())
    }
}

/// Fault-injecting store wrapper.
///
/// Reads and writes pass through to `inner` until the corresponding failure
/// switch is turned on. Switches are shared between clones so a test can keep
/// a handle while the controller owns another.
#[derive(Debug, Clone)]
pub struct ChaoticStore<S> {
    inner: S,
    fail_reads: Arc<AtomicBool>,
    fail_writes: Arc<AtomicBool>,
}

impl<S: Store> ChaoticStore<S> {
    /// Wrap `inner` with all failure switches off.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            fail_reads: Arc::new(AtomicBool::new(false)),
            fail_writes: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Make every subsequent `get` fail with [`StoreError::Unavailable`].
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent `set`/`remove` fail with
    /// [`StoreError::QuotaExceeded`].
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// The wrapped store.
    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl<S: Store> Store for ChaoticStore<S> {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable { reason: "injected read failure".to_owned() });
        }
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::QuotaExceeded);
        }
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::QuotaExceeded);
        }
        self.inner.remove(key)
    }
}
