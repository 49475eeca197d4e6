//! Reference model for model-based testing.
//!
//! The model is a simplified implementation of gated access: integer
//! timestamps, a boolean write-failure switch and a slot table of widgets. It
//! serves as the oracle against which the real controller is verified.
//!
//! # Design Principles
//!
//! - Simplicity: The model should be obviously correct
//! - Observable behavior only: Captures WHAT, not HOW
//! - Deterministic: Same inputs produce same outputs

pub mod operation;
mod widget;
mod world;

pub use operation::{Operation, OperationError, OperationResult, WidgetSlot};
pub use widget::ModelWidget;
pub use world::{ModelWorld, ObservableState};
