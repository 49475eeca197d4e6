//! Operations for model-based testing.
//!
//! Operations represent everything a page and its visitor can do. They are
//! generated randomly by proptest (or `arbitrary` when fuzzing) and applied
//! to both the model and the real controller with its widgets.

use arbitrary::Arbitrary;

/// Widget slot on the simulated page (0-indexed).
pub type WidgetSlot = u8;

/// Operations that can be applied to the system.
#[derive(Debug, Clone, Arbitrary)]
pub enum Operation {
    /// Mount a widget into an empty slot.
    Mount {
        /// Target slot.
        slot: WidgetSlot,
        /// Whether the widget's resource is gated.
        gated: bool,
    },

    /// Tear down the widget in a slot.
    Unmount {
        /// Target slot.
        slot: WidgetSlot,
    },

    /// Visitor clicks a widget.
    Click {
        /// Target slot.
        slot: WidgetSlot,
    },

    /// Visitor submits the unlock form on a widget.
    Submit {
        /// Target slot.
        slot: WidgetSlot,
        /// Whether every required field is filled out.
        complete: bool,
    },

    /// Visitor dismisses the unlock form on a widget.
    CloseForm {
        /// Target slot.
        slot: WidgetSlot,
    },

    /// Advance the clock.
    AdvanceTime {
        /// Hours to advance (a u16 spans several expiry windows).
        hours: u16,
    },

    /// Make store writes fail (or succeed again).
    SetWriteFailure {
        /// Whether writes fail.
        fail: bool,
    },

    /// Overwrite the stored record with garbage.
    CorruptRecord,

    /// Navigate away and back: every widget unmounts and a fresh controller
    /// is built over the same store.
    Reload,
}

impl Operation {
    /// Slot targeted by this operation, if any.
    pub fn slot(&self) -> Option<WidgetSlot> {
        match self {
            Self::Mount { slot, .. }
            | Self::Unmount { slot }
            | Self::Click { slot }
            | Self::Submit { slot, .. }
            | Self::CloseForm { slot } => Some(*slot),
            Self::AdvanceTime { .. }
            | Self::SetWriteFailure { .. }
            | Self::CorruptRecord
            | Self::Reload => None,
        }
    }

    /// Same operation with its slot reduced into `0..num_slots`.
    #[must_use]
    pub fn clamp_slot(self, num_slots: usize) -> Self {
        let n = u8::try_from(num_slots.max(1)).unwrap_or(u8::MAX);
        match self {
            Self::Mount { slot, gated } => Self::Mount { slot: slot % n, gated },
            Self::Unmount { slot } => Self::Unmount { slot: slot % n },
            Self::Click { slot } => Self::Click { slot: slot % n },
            Self::Submit { slot, complete } => Self::Submit { slot: slot % n, complete },
            Self::CloseForm { slot } => Self::CloseForm { slot: slot % n },
            other => other,
        }
    }
}

/// Result of applying an operation.
///
/// Used to compare model and real system behavior.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationResult {
    /// Operation succeeded with nothing to report.
    Ok,

    /// The resource was opened.
    Opened,

    /// The unlock form was shown.
    FormShown,

    /// The form was rejected for missing fields.
    ValidationFailed,

    /// Operation failed with expected error.
    Error(OperationError),
}

/// Expected errors that can occur during operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationError {
    /// Slot index outside the page.
    InvalidSlot,

    /// Slot already holds a widget.
    SlotOccupied,

    /// Slot holds no widget.
    NoWidget,

    /// Form event while no form is open.
    FormNotOpen,
}

impl OperationResult {
    /// Check if operation succeeded.
    pub fn is_ok(&self) -> bool {
        !self.is_err()
    }

    /// Check if operation failed.
    pub fn is_err(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_slot_wraps() {
        let op = Operation::Click { slot: 9 }.clamp_slot(4);
        assert_eq!(op.slot(), Some(1));
        assert_eq!(Operation::Reload.clamp_slot(4).slot(), None);
    }

    #[test]
    fn result_classification() {
        assert!(OperationResult::Opened.is_ok());
        assert!(OperationResult::ValidationFailed.is_ok());
        assert!(OperationResult::Error(OperationError::NoWidget).is_err());
    }
}
