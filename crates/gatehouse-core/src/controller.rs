//! Gated access controller.
//!
//! Decides whether the current visitor may open gated downloads, persists a
//! successful unlock for a fixed window, and tells every mounted widget when
//! access changes.
//!
//! ## Responsibilities
//!
//! - Access check: read the unlock record and compare its age to the window
//! - Grant: overwrite the record with the current time, then broadcast
//! - Notification: fan out [`UnlockEvent`]s to registered callbacks
//!
//! ## Failure semantics
//!
//! Nothing crosses the public contract as an error. A missing, malformed or
//! unreadable record reads as locked. A failed write still unlocks the page:
//! the grant is kept in memory for this controller (and its clones) and the
//! broadcast fires, but a fresh controller over the same store reads locked.
//!
//! ## Ordering
//!
//! `grant_access` finishes its store write before emitting, so a callback that
//! immediately calls `check_access` observes the new grant.

use std::{
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use crate::{
    broadcast::{Broadcaster, Subscription, UnlockEvent},
    config::ControllerConfig,
    contact::ContactInfo,
    env::Environment,
    record::UnlockRecord,
    store::Store,
};

/// Whether a grant reached durable storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantOutcome {
    /// Record written; access survives reloads until expiry.
    Persisted,
    /// Write failed; access holds for this controller only.
    SessionOnly,
}

struct Inner<E, S> {
    env: E,
    store: S,
    config: ControllerConfig,
    broadcaster: Arc<Broadcaster>,
    /// Grant kept in memory when the store rejected the write.
    session_grant: Mutex<Option<UnlockRecord>>,
}

/// Gated access controller.
///
/// Cheap to clone; clones share the store handle, the session grant and the
/// subscriber list, so one controller can be handed to every widget on a page.
///
/// # Type Parameters
///
/// - `E`: Environment implementation for time
/// - `S`: Store holding the unlock record
pub struct AccessController<E, S> {
    inner: Arc<Inner<E, S>>,
}

impl<E, S> Clone for AccessController<E, S> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<E, S> std::fmt::Debug for AccessController<E, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessController")
            .field("config", &self.inner.config)
            .field("subscribers", &self.inner.broadcaster.len())
            .finish_non_exhaustive()
    }
}

impl<E: Environment, S: Store> AccessController<E, S> {
    /// Create a controller with the default configuration.
    pub fn new(env: E, store: S) -> Self {
        Self::with_config(env, store, ControllerConfig::default())
    }

    /// Create a controller with an explicit configuration.
    pub fn with_config(env: E, store: S, config: ControllerConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                env,
                store,
                config,
                broadcaster: Broadcaster::new(),
                session_grant: Mutex::new(None),
            }),
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &ControllerConfig {
        &self.inner.config
    }

    /// Access window.
    pub fn unlock_duration(&self) -> Duration {
        self.inner.config.unlock_duration
    }

    /// Whether the visitor may open gated resources right now.
    ///
    /// Never fails: a missing, expired, malformed or unreadable record all
    /// read as `false`. Expired records are left in place.
    pub fn check_access(&self) -> bool {
        self.effective_record().is_some()
    }

    /// Instant at which current access expires, or `None` when locked.
    pub fn unlocked_until(&self) -> Option<u64> {
        self.effective_record().map(|r| r.expires_at(self.unlock_duration()))
    }

    /// Record a successful unlock-form submission.
    ///
    /// Overwrites any previous record with `timestamp = now`, then emits one
    /// [`UnlockEvent`]. The caller has already validated `contact`; its
    /// contents are not inspected or stored. Granting again simply restarts
    /// the window.
    pub fn grant_access(&self, contact: &ContactInfo) -> GrantOutcome {
        let now = self.inner.env.now_ms();
        let record = UnlockRecord::new(now);

        let outcome = match self.persist(&record) {
            Ok(()) => {
                *self.session_grant() = None;
                GrantOutcome::Persisted
            },
            Err(reason) => {
                tracing::warn!(
                    key = %self.inner.config.record_key,
                    "unlock not persisted, granting for this session only: {}",
                    reason
                );
                *self.session_grant() = Some(record);
                GrantOutcome::SessionOnly
            },
        };

        tracing::info!(
            unlocked_at = now,
            fields = contact.iter().count(),
            persisted = outcome == GrantOutcome::Persisted,
            "gated downloads unlocked"
        );

        let notified = self.inner.broadcaster.emit(&UnlockEvent { unlocked_at: now });
        tracing::debug!(notified, "unlock broadcast delivered");

        outcome
    }

    /// Register `callback` to run on every future grant.
    ///
    /// Widgets call this on mount and drop or
    /// [`unsubscribe`](Subscription::unsubscribe) the returned handle on
    /// teardown.
    pub fn on_unlock_changed<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&UnlockEvent) + Send + Sync + 'static,
    {
        self.inner.broadcaster.subscribe(callback)
    }

    /// Number of registered unlock callbacks.
    pub fn subscriber_count(&self) -> usize {
        self.inner.broadcaster.len()
    }

    /// The most recent valid grant, persisted or session-only.
    fn effective_record(&self) -> Option<UnlockRecord> {
        let now = self.inner.env.now_ms();
        let duration = self.unlock_duration();

        let stored = self.load().filter(|r| r.is_valid_at(now, duration));
        let session = (*self.session_grant()).filter(|r| r.is_valid_at(now, duration));

        match (stored, session) {
            (Some(a), Some(b)) => Some(if a.timestamp >= b.timestamp { a } else { b }),
            (a, b) => a.or(b),
        }
    }

    /// Read and decode the stored record, degrading every failure to `None`.
    fn load(&self) -> Option<UnlockRecord> {
        let key = &self.inner.config.record_key;

        let raw = match self.inner.store.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(
                    key = %key,
                    transient = e.is_transient(),
                    "unlock record unreadable, treating as locked: {}",
                    e
                );
                return None;
            },
        };

        match UnlockRecord::parse(&raw) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::debug!(key = %key, "ignoring unlock record: {}", e);
                None
            },
        }
    }

    fn persist(&self, record: &UnlockRecord) -> Result<(), String> {
        let encoded = record.encode().map_err(|e| e.to_string())?;
        self.inner.store.set(&self.inner.config.record_key, &encoded).map_err(|e| e.to_string())
    }

    fn session_grant(&self) -> std::sync::MutexGuard<'_, Option<UnlockRecord>> {
        self.inner.session_grant.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU64, Ordering};

    use super::*;
    use crate::store::{ChaoticStore, MemoryStore};

    const HOUR_MS: u64 = 60 * 60 * 1000;
    const DAY_MS: u64 = 24 * HOUR_MS;

    #[derive(Clone, Default)]
    struct TestEnv(Arc<AtomicU64>);

    impl TestEnv {
        fn set(&self, ms: u64) {
            self.0.store(ms, Ordering::SeqCst);
        }
    }

    impl Environment for TestEnv {
        fn now_ms(&self) -> u64 {
            self.0.load(Ordering::SeqCst)
        }
    }

    fn contact() -> ContactInfo {
        ContactInfo::new().with("name", "A").with("email", "a@x.com").with("phone", "123")
    }

    #[test]
    fn no_record_is_locked() {
        let controller = AccessController::new(TestEnv::default(), MemoryStore::new());
        assert!(!controller.check_access());
        assert_eq!(controller.unlocked_until(), None);
    }

    #[test]
    fn grant_writes_record_under_configured_key() {
        let env = TestEnv::default();
        env.set(1_000);
        let store = MemoryStore::new();
        let config = ControllerConfig::default().with_record_key("unlock");
        let controller = AccessController::with_config(env, store.clone(), config);

        assert_eq!(controller.grant_access(&contact()), GrantOutcome::Persisted);
        assert_eq!(store.get("unlock"), Ok(Some(r#"{"timestamp":1000}"#.to_owned())));
        assert_eq!(controller.unlocked_until(), Some(1_000 + 14 * DAY_MS));
    }

    #[test]
    fn expired_record_is_not_purged() {
        let env = TestEnv::default();
        let store = MemoryStore::new();
        let controller = AccessController::new(env.clone(), store.clone());

        controller.grant_access(&contact());
        env.set(15 * DAY_MS);

        assert!(!controller.check_access());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn regrant_restarts_window() {
        let env = TestEnv::default();
        let controller = AccessController::new(env.clone(), MemoryStore::new());

        controller.grant_access(&contact());
        env.set(10 * DAY_MS);
        controller.grant_access(&contact());

        env.set(20 * DAY_MS);
        assert!(controller.check_access());
        env.set(24 * DAY_MS);
        assert!(!controller.check_access());
    }

    #[test]
    fn write_failure_keeps_session_grant() {
        let env = TestEnv::default();
        let store = ChaoticStore::new(MemoryStore::new());
        store.set_fail_writes(true);
        let controller = AccessController::new(env.clone(), store.clone());

        assert_eq!(controller.grant_access(&contact()), GrantOutcome::SessionOnly);
        assert!(controller.check_access());
        assert!(controller.clone().check_access());

        let fresh = AccessController::new(env.clone(), store.clone());
        assert!(!fresh.check_access());

        env.set(14 * DAY_MS);
        assert!(!controller.check_access());
    }

    #[test]
    fn read_failure_is_locked() {
        let store = ChaoticStore::new(MemoryStore::new());
        let controller = AccessController::new(TestEnv::default(), store.clone());
        controller.grant_access(&contact());

        store.set_fail_reads(true);
        assert!(!controller.check_access());

        store.set_fail_reads(false);
        assert!(controller.check_access());
    }

    #[test]
    fn session_grant_cleared_after_successful_persist() {
        let env = TestEnv::default();
        let store = ChaoticStore::new(MemoryStore::new());
        let controller = AccessController::new(env.clone(), store.clone());

        store.set_fail_writes(true);
        controller.grant_access(&contact());
        store.set_fail_writes(false);

        env.set(DAY_MS);
        assert_eq!(controller.grant_access(&contact()), GrantOutcome::Persisted);

        store.set_fail_reads(true);
        assert!(!controller.check_access(), "only the persisted grant should remain");
    }

    #[test]
    fn malformed_record_is_locked() {
        let store = MemoryStore::new();
        store.set("gated-downloads-unlock", "{not json").expect("seed");
        let controller = AccessController::new(TestEnv::default(), store);
        assert!(!controller.check_access());
    }

    #[test]
    fn callback_observes_grant() {
        let env = TestEnv::default();
        env.set(5);
        let controller = AccessController::new(env, MemoryStore::new());

        let seen = Arc::new(Mutex::new(None));
        let probe = controller.clone();
        let sink = Arc::clone(&seen);
        let sub = controller.on_unlock_changed(move |event| {
            *sink.lock().unwrap_or_else(PoisonError::into_inner) =
                Some((event.unlocked_at, probe.check_access()));
        });

        controller.grant_access(&contact());
        assert_eq!(*seen.lock().unwrap_or_else(PoisonError::into_inner), Some((5, true)));

        sub.unsubscribe();
        assert_eq!(controller.subscriber_count(), 0);
    }
}
