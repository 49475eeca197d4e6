//! Unlock broadcast.
//!
//! Multi-subscriber, zero-buffer fan-out. An emitted [`UnlockEvent`] reaches
//! every callback registered at the moment of emission and is then discarded:
//! no queue, no replay, no retry. A widget mounted after the event simply reads
//! the current access state on mount.
//!
//! # Invariants
//!
//! - Exactly once: each emit invokes each registered callback once
//! - Order: callbacks run in registration order
//! - No lock held during callbacks: a callback may subscribe, unsubscribe or
//!   query access state without deadlocking
//! - Snapshot delivery: an emit delivers to the callbacks registered when it
//!   started. A callback removed by another callback during that emit still
//!   receives the in-flight event once and nothing after it. One subscribed
//!   during an emit first hears the next one.

use std::sync::{
    Arc, Mutex, PoisonError, Weak,
    atomic::{AtomicU64, Ordering},
};

/// Notification that access was granted somewhere on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnlockEvent {
    /// Grant time, Unix epoch milliseconds.
    pub unlocked_at: u64,
}

/// Identifier of one registered callback.
pub type SubscriberId = u64;

type Callback = Arc<dyn Fn(&UnlockEvent) + Send + Sync>;

/// Subscriber list.
#[derive(Default)]
pub struct Broadcaster {
    next_id: AtomicU64,
    subscribers: Mutex<Vec<(SubscriberId, Callback)>>,
}

impl std::fmt::Debug for Broadcaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Broadcaster").field("subscribers", &self.len()).finish()
    }
}

impl Broadcaster {
    /// Create an empty broadcaster.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register `callback`. The returned [`Subscription`] deregisters it when
    /// unsubscribed or dropped.
    pub fn subscribe<F>(self: &Arc<Self>, callback: F) -> Subscription
    where
        F: Fn(&UnlockEvent) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.lock().push((id, Arc::new(callback)));
        tracing::debug!(subscriber = id, "unlock subscriber registered");

        Subscription { id, broadcaster: Arc::downgrade(self) }
    }

    /// Invoke every registered callback once with `event`.
    ///
    /// Returns the number of callbacks invoked.
    pub fn emit(&self, event: &UnlockEvent) -> usize {
        // Snapshot so callbacks run without the lock held.
        let snapshot: Vec<Callback> = self.lock().iter().map(|(_, cb)| Arc::clone(cb)).collect();

        for callback in &snapshot {
            callback(event);
        }

        snapshot.len()
    }

    /// Number of registered callbacks.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether no callbacks are registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn remove(&self, id: SubscriberId) -> bool {
        let mut subscribers = self.lock();
        let before = subscribers.len();
        subscribers.retain(|(sub_id, _)| *sub_id != id);
        before != subscribers.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(SubscriberId, Callback)>> {
        self.subscribers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Handle to a registered unlock callback.
///
/// Call [`Subscription::unsubscribe`] on widget teardown. Dropping the handle
/// has the same effect, so a widget that is dropped without an explicit
/// teardown does not leave a callback behind.
#[must_use = "dropping a Subscription immediately deregisters its callback"]
#[derive(Debug)]
pub struct Subscription {
    id: SubscriberId,
    broadcaster: Weak<Broadcaster>,
}

impl Subscription {
    /// Deregister the callback.
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(broadcaster) = self.broadcaster.upgrade() {
            if broadcaster.remove(self.id) {
                tracing::debug!(subscriber = self.id, "unlock subscriber removed");
            }
        }
    }
}
