//! Commands that drive a device through its state machine

use hc_state_machine::{DeviceContext, DeviceTrigger};
use std::sync::Arc;

use crate::error::CommandError;
use crate::invoker::Command;

/// The reversible operations a device supports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceCommandKind {
    Activate,
    Deactivate,
    TriggerError,
    Reset,
    StartMaintenance,
    CompleteMaintenance,
}

impl DeviceCommandKind {
    /// Trigger sent by `execute`
    pub fn forward(self) -> DeviceTrigger {
        match self {
            DeviceCommandKind::Activate => DeviceTrigger::Activate,
            DeviceCommandKind::Deactivate => DeviceTrigger::Deactivate,
            DeviceCommandKind::TriggerError => DeviceTrigger::Error,
            DeviceCommandKind::Reset => DeviceTrigger::Reset,
            DeviceCommandKind::StartMaintenance => DeviceTrigger::Maintenance,
            DeviceCommandKind::CompleteMaintenance => DeviceTrigger::Done,
        }
    }

    /// Trigger sent by `undo`
    pub fn inverse(self) -> DeviceTrigger {
        match self {
            DeviceCommandKind::Activate => DeviceTrigger::Deactivate,
            DeviceCommandKind::Deactivate => DeviceTrigger::Activate,
            DeviceCommandKind::TriggerError => DeviceTrigger::Reset,
            DeviceCommandKind::Reset => DeviceTrigger::Error,
            DeviceCommandKind::StartMaintenance => DeviceTrigger::Done,
            DeviceCommandKind::CompleteMaintenance => DeviceTrigger::Maintenance,
        }
    }

    fn label(self) -> &'static str {
        match self {
            DeviceCommandKind::Activate => "Activate",
            DeviceCommandKind::Deactivate => "Deactivate",
            DeviceCommandKind::TriggerError => "Error on",
            DeviceCommandKind::Reset => "Reset",
            DeviceCommandKind::StartMaintenance => "Maintenance start",
            DeviceCommandKind::CompleteMaintenance => "Maintenance complete",
        }
    }
}

/// A command bound to one device
///
/// Running the command changes the device state and queues its DeviceEvent;
/// call [`DeviceContext::publish_pending`] on [`DeviceCommand::device`] to
/// deliver it.
#[derive(Debug, Clone)]
pub struct DeviceCommand {
    kind: DeviceCommandKind,
    device: Arc<DeviceContext>,
}

impl DeviceCommand {
    pub fn new(kind: DeviceCommandKind, device: Arc<DeviceContext>) -> Self {
        Self { kind, device }
    }

    pub fn kind(&self) -> DeviceCommandKind {
        self.kind
    }

    pub fn device_id(&self) -> &str {
        self.device.device_id()
    }

    pub fn device(&self) -> &Arc<DeviceContext> {
        &self.device
    }
}

impl Command for DeviceCommand {
    type Error = CommandError;

    fn description(&self) -> String {
        format!("{} {}", self.kind.label(), self.device.device_id())
    }

    fn execute(&self) -> Result<(), CommandError> {
        self.device.apply(self.kind.forward())?;
        Ok(())
    }

    fn undo(&self) -> Result<(), CommandError> {
        self.device.apply(self.kind.inverse())?;
        Ok(())
    }
}
