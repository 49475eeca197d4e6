//! Controller configuration.

use std::time::Duration;

/// Default access window: fourteen days.
pub const DEFAULT_UNLOCK_DURATION: Duration = Duration::from_secs(14 * 24 * 60 * 60);

/// Default store key holding the unlock record.
pub const DEFAULT_RECORD_KEY: &str = "gated-downloads-unlock";

/// Access controller configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    /// How long a grant remains valid.
    pub unlock_duration: Duration,
    /// Store key holding the unlock record.
    pub record_key: String,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            unlock_duration: DEFAULT_UNLOCK_DURATION,
            record_key: DEFAULT_RECORD_KEY.to_owned(),
        }
    }
}

impl ControllerConfig {
    /// Override the access window.
    #[must_use]
    pub fn with_unlock_duration(mut self, unlock_duration: Duration) -> Self {
        self.unlock_duration = unlock_duration;
        self
    }

    /// Override the store key.
    #[must_use]
    pub fn with_record_key(mut self, record_key: impl Into<String>) -> Self {
        self.record_key = record_key.into();
        self
    }
}
