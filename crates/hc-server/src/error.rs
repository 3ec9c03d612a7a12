use hc_automation::AutomationError;
use hc_command::CommandError;
use thiserror::Error;

/// Errors that abort startup
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("No sensors could be initialized")]
    NoSensors,

    #[error("Device setup failed: {0}")]
    Device(#[from] CommandError),

    #[error("Rule setup failed: {0}")]
    Rule(#[from] AutomationError),
}

pub type StartupResult<T> = Result<T, StartupError>;
