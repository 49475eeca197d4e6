//! Production Environment implementation using wall-clock time.
//!
//! This module provides `SystemEnv`, the production implementation of the
//! `Environment` trait backed by `std::time::SystemTime`.

use std::time::{SystemTime, UNIX_EPOCH};

use gatehouse_core::Environment;

/// Production environment using the system clock.
///
/// A clock set before 1970 reads as epoch zero rather than panicking; every
/// record written then looks ancient and reads as expired.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnv;

impl SystemEnv {
    /// Create a new system environment.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Environment for SystemEnv {
    fn now_ms(&self) -> u64 {
        match SystemTime::now().duration_since(UNIX_EPOCH) {
            Ok(elapsed) => u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            Err(e) => {
                tracing::error!("system clock before Unix epoch: {}", e);
                0
            },
        }
    }
}
