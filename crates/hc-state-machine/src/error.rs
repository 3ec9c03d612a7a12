//! State machine errors

use hc_core::DeviceStateType;
use thiserror::Error;

use crate::DeviceTrigger;

/// Result type for state machine operations
pub type StateResult<T> = Result<T, StateError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StateError {
    /// The trigger is not accepted in the current state
    #[error("invalid transition on '{device_id}': {trigger} is not accepted in {from}")]
    InvalidTransition {
        device_id: String,
        from: DeviceStateType,
        trigger: DeviceTrigger,
    },

    #[error("unknown trigger: {0}")]
    UnknownTrigger(String),
}
