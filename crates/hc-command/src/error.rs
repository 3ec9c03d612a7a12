//! Command errors

use hc_state_machine::StateError;
use thiserror::Error;

/// Result type for command operations
pub type CommandResult<T> = Result<T, CommandError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("device not found: {0}")]
    UnknownDevice(String),

    #[error("device already registered: {0}")]
    DuplicateDevice(String),

    /// The device rejected the trigger
    #[error(transparent)]
    State(#[from] StateError),
}
