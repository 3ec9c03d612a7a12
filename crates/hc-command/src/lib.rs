//! Reversible device commands
//!
//! [`CommandInvoker`] is a generic undo/redo history over any [`Command`].
//! [`DeviceController`] registers devices and routes every operation on them
//! through one shared history of [`DeviceCommand`]s.

mod controller;
mod device_command;
mod error;
mod invoker;

pub use controller::DeviceController;
pub use device_command::{DeviceCommand, DeviceCommandKind};
pub use error::{CommandError, CommandResult};
pub use invoker::{Command, CommandInvoker};
