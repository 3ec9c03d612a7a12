//! Rule-based automation
//!
//! An [`AutomationEngine`] holds an append-only list of threshold [`Rule`]s.
//! Each `sensor.reading` event is checked against the rules of its category;
//! a triggered rule runs its device action through the shared
//! `DeviceController` and may raise an `alert` event.

mod engine;
mod error;
mod rule;

pub use engine::AutomationEngine;
pub use error::{AutomationError, AutomationResult};
pub use rule::{rules_from_config, Rule, RuleAction};
