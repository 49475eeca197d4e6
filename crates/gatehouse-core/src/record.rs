//! Persisted unlock record.
//!
//! A single JSON object stored under one key in the visitor's local store:
//!
//! ```text
//! {"timestamp": 1735689600000}
//! ```
//!
//! `timestamp` is the grant time in Unix epoch milliseconds. Any other fields
//! present in the stored object are ignored on read, so older or newer
//! writers can coexist.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from decoding or encoding a persisted record.
#[derive(Debug, Error)]
pub enum RecordError {
    /// Stored value is not an object with a non-negative integer `timestamp`.
    #[error("malformed unlock record: {reason}")]
    Malformed {
        /// Decoder message.
        reason: String,
    },

    /// Record could not be serialized.
    #[error("failed to encode unlock record: {reason}")]
    Encode {
        /// Encoder message.
        reason: String,
    },
}

/// Proof that the visitor submitted the unlock form at `timestamp`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlockRecord {
    /// Grant time, Unix epoch milliseconds.
    pub timestamp: u64,
}

impl UnlockRecord {
    /// Create a record granted at `timestamp`.
    pub fn new(timestamp: u64) -> Self {
        Self { timestamp }
    }

    /// Decode a stored value.
    pub fn parse(raw: &str) -> Result<Self, RecordError> {
        let malformed = |e: serde_json::Error| RecordError::Malformed { reason: e.to_string() };

        // serde accepts `[ts]` for a struct; only the object form is valid.
        let value: serde_json::Value = serde_json::from_str(raw).map_err(malformed)?;
        if !value.is_object() {
            return Err(RecordError::Malformed { reason: "expected a JSON object".to_owned() });
        }
        serde_json::from_value(value).map_err(malformed)
    }

    /// Encode for storage.
    pub fn encode(&self) -> Result<String, RecordError> {
        serde_json::to_string(self).map_err(|e| RecordError::Encode { reason: e.to_string() })
    }

    /// Whether the record still grants access at `now`.
    ///
    /// Valid iff `now - timestamp < duration`. A timestamp ahead of `now`
    /// (clock skew between page views) has negative age and is valid.
    pub fn is_valid_at(&self, now: u64, duration: Duration) -> bool {
        match now.checked_sub(self.timestamp) {
            Some(age) => u128::from(age) < duration.as_millis(),
            None => true,
        }
    }

    /// First instant at which the record no longer grants access.
    pub fn expires_at(&self, duration: Duration) -> u64 {
        let millis = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        self.timestamp.saturating_add(millis)
    }
}
