//! Simulated environment with a manually driven clock.
//!
//! Clones share one clock, so every controller, widget and test handle built
//! from the same `SimEnv` observes the same "now".

use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use gatehouse_core::Environment;

/// Deterministic environment for tests.
#[derive(Debug, Clone, Default)]
pub struct SimEnv {
    now_ms: Arc<AtomicU64>,
}

impl SimEnv {
    /// Clock starting at Unix epoch zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clock starting at `now_ms`.
    pub fn starting_at(now_ms: u64) -> Self {
        Self { now_ms: Arc::new(AtomicU64::new(now_ms)) }
    }

    /// Move the clock forward by `by`, saturating at `u64::MAX`.
    pub fn advance(&self, by: Duration) {
        let millis = u64::try_from(by.as_millis()).unwrap_or(u64::MAX);
        let _ = self.now_ms.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |now| {
            Some(now.saturating_add(millis))
        });
    }

    /// Set the clock to `now_ms`. May move backwards to model clock skew.
    pub fn set(&self, now_ms: u64) {
        self.now_ms.store(now_ms, Ordering::SeqCst);
    }
}

impl Environment for SimEnv {
    fn now_ms(&self) -> u64 {
        self.now_ms.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_clock() {
        let env = SimEnv::starting_at(100);
        let other = env.clone();
        env.advance(Duration::from_millis(50));
        assert_eq!(other.now_ms(), 150);
    }

    #[test]
    fn advance_saturates() {
        let env = SimEnv::starting_at(u64::MAX - 1);
        env.advance(Duration::from_secs(1));
        assert_eq!(env.now_ms(), u64::MAX);
    }

    #[test]
    fn set_can_rewind() {
        let env = SimEnv::starting_at(1_000);
        env.set(10);
        assert_eq!(env.now_ms(), 10);
    }
}
