//! Environment abstraction for deterministic testing.
//!
//! The `Environment` trait decouples access decisions from the system clock.
//! This enables:
//!
//! - Deterministic Simulation: the harness provides a manually-advanced clock,
//!   so a two-week expiry window can be crossed in a single test step.
//!
//! - Production Runtime: `SystemEnv` reads wall-clock time without any change
//!   to the controller logic.
//!
//! # Invariants
//!
//! - Unit: `now_ms()` is Unix epoch milliseconds, the same unit stored in a
//!   persisted unlock record
//! - Isolation: Implementations must not share global state

/// Abstract environment providing the current time.
///
/// Unlike a monotonic `Instant`, the value returned here is persisted and
/// compared across page views and process restarts, so it must be wall-clock
/// time.
pub trait Environment: Clone + Send + Sync + 'static {
    /// Returns the current time as milliseconds since the Unix epoch.
    fn now_ms(&self) -> u64;
}
