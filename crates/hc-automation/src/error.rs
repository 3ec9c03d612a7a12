//! Automation errors

use hc_command::CommandError;
use thiserror::Error;

/// Result type for automation operations
pub type AutomationResult<T> = Result<T, AutomationError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AutomationError {
    #[error("invalid rule '{name}': {reason}")]
    InvalidRule { name: String, reason: String },

    #[error("unknown rule action: {0}")]
    UnknownAction(String),

    #[error(transparent)]
    Command(#[from] CommandError),
}
