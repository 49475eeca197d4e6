//! Deterministic test harness for Gatehouse.
//!
//! A manually driven [`SimEnv`] clock plus a reference model of one page with
//! several resource widgets sharing a controller.
//!
//! # Model-Based Testing
//!
//! The `model` module provides a reference implementation for model-based
//! testing. Operations are applied to both the model and the real controller,
//! and their observable states are compared.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod model;
pub mod sim_env;

pub use model::{
    ModelWidget, ModelWorld, ObservableState, Operation, OperationError, OperationResult,
    WidgetSlot,
};
pub use sim_env::SimEnv;
