//! Component errors

use thiserror::Error;

/// Result type for component construction
pub type ComponentResult<T> = Result<T, ComponentError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ComponentError {
    #[error("unknown sensor kind: {0}")]
    UnknownSensorKind(String),

    #[error("unknown protocol: {0}")]
    UnknownProtocol(String),
}
