//! Device registry and command entry point

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use hc_core::DeviceStateType;
use hc_event_bus::EventBus;
use hc_state_machine::DeviceContext;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::device_command::{DeviceCommand, DeviceCommandKind};
use crate::error::{CommandError, CommandResult};
use crate::invoker::CommandInvoker;

/// Owns the registered devices and a shared command history
///
/// All device operations go through the internal [`CommandInvoker`], so they
/// can be undone in reverse order. A command's `DeviceEvent` is published
/// after the history lock is released, so its handlers may call back into
/// the controller.
pub struct DeviceController {
    bus: Arc<EventBus>,
    devices: DashMap<String, Arc<DeviceContext>>,
    invoker: Mutex<CommandInvoker<DeviceCommand>>,
}

impl DeviceController {
    pub fn new(bus: Arc<EventBus>) -> Self {
        Self {
            bus,
            devices: DashMap::new(),
            invoker: Mutex::new(CommandInvoker::new()),
        }
    }

    /// Register a new device in the Idle state
    pub fn register_device(
        &self,
        device_id: impl Into<String>,
    ) -> CommandResult<Arc<DeviceContext>> {
        let device_id = device_id.into();
        match self.devices.entry(device_id.clone()) {
            Entry::Occupied(_) => {
                warn!(device_id = %device_id, "Device already registered");
                Err(CommandError::DuplicateDevice(device_id))
            }
            Entry::Vacant(entry) => {
                let context = Arc::new(DeviceContext::new(device_id.clone(), self.bus.clone()));
                entry.insert(context.clone());
                info!(device_id = %device_id, "Device registered");
                Ok(context)
            }
        }
    }

    /// Remove a device; commands already in history keep their handle to it
    pub fn remove_device(&self, device_id: &str) -> bool {
        let removed = self.devices.remove(device_id).is_some();
        if removed {
            info!(device_id, "Device removed");
        }
        removed
    }

    pub fn context(&self, device_id: &str) -> CommandResult<Arc<DeviceContext>> {
        self.devices
            .get(device_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| CommandError::UnknownDevice(device_id.to_string()))
    }

    pub fn device_state(&self, device_id: &str) -> CommandResult<DeviceStateType> {
        Ok(self.context(device_id)?.current_state())
    }

    pub fn contains(&self, device_id: &str) -> bool {
        self.devices.contains_key(device_id)
    }

    /// Registered device ids, sorted
    pub fn device_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.devices.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }

    pub fn device_count(&self) -> usize {
        self.devices.len()
    }

    /// Build a command for a device and run it through the history
    #[instrument(skip(self))]
    pub fn execute(&self, device_id: &str, kind: DeviceCommandKind) -> CommandResult<()> {
        let device = self.context(device_id)?;
        let result = self
            .invoker
            .lock()
            .execute(DeviceCommand::new(kind, device.clone()));
        device.publish_pending();
        result
    }

    pub fn activate(&self, device_id: &str) -> CommandResult<()> {
        self.execute(device_id, DeviceCommandKind::Activate)
    }

    pub fn deactivate(&self, device_id: &str) -> CommandResult<()> {
        self.execute(device_id, DeviceCommandKind::Deactivate)
    }

    pub fn trigger_error(&self, device_id: &str) -> CommandResult<()> {
        self.execute(device_id, DeviceCommandKind::TriggerError)
    }

    pub fn reset(&self, device_id: &str) -> CommandResult<()> {
        self.execute(device_id, DeviceCommandKind::Reset)
    }

    pub fn start_maintenance(&self, device_id: &str) -> CommandResult<()> {
        self.execute(device_id, DeviceCommandKind::StartMaintenance)
    }

    pub fn complete_maintenance(&self, device_id: &str) -> CommandResult<()> {
        self.execute(device_id, DeviceCommandKind::CompleteMaintenance)
    }

    /// Undo the most recent device command
    pub fn undo_last(&self) -> CommandResult<Option<String>> {
        let (result, device) = {
            let mut invoker = self.invoker.lock();
            let device = invoker.peek_undo().map(|c| c.device().clone());
            (invoker.undo(), device)
        };
        if let Some(device) = device {
            device.publish_pending();
        }
        result
    }

    /// Redo the most recently undone device command
    pub fn redo_last(&self) -> CommandResult<Option<String>> {
        let (result, device) = {
            let mut invoker = self.invoker.lock();
            let device = invoker.peek_redo().map(|c| c.device().clone());
            (invoker.redo(), device)
        };
        if let Some(device) = device {
            device.publish_pending();
        }
        result
    }

    pub fn command_history(&self) -> Vec<String> {
        self.invoker.lock().history()
    }

    pub fn can_undo(&self) -> bool {
        self.invoker.lock().can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.invoker.lock().can_redo()
    }

    pub fn clear_history(&self) {
        self.invoker.lock().clear();
    }
}
