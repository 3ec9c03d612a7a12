//! Device state machine
//!
//! Each device is a [`DeviceContext`] holding one of four states. Triggers
//! move it along the table in [`next_state`]; every committed transition
//! publishes a `DeviceEvent` on the shared event bus.

mod context;
mod error;
mod transition;

pub use context::DeviceContext;
pub use error::{StateError, StateResult};
pub use transition::{accepts, next_state, DeviceTrigger, Transition};

pub use hc_core::DeviceStateType;
