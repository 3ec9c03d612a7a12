//! Core types for homecore
//!
//! This crate provides the fundamental types shared by every other crate:
//! sensor readings, device state identifiers, the event envelope and the
//! payloads published on the event bus.

mod context;
mod device;
mod event;
mod reading;

pub use context::Context;
pub use device::DeviceStateType;
pub use event::{Event, EventData, EventType};
pub use reading::{now_ms, Reading, SensorCategory, UnknownCategory};

/// Standard events published on the bus
pub mod events {
    use super::*;
    use serde::{Deserialize, Serialize};

    /// Event name for processed, valid sensor readings
    pub const SENSOR_READING: &str = "sensor.reading";

    /// Event name for committed device state transitions
    pub const DEVICE_STATE_CHANGED: &str = "device.state_changed";

    /// Event name for alerts raised by automation rules
    pub const ALERT: &str = "alert";

    /// Data for SENSOR_READING events
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct SensorEvent {
        pub name: String,
        /// Category display name, e.g. `"Temperature"`
        pub category: String,
        pub value: f64,
        pub timestamp_ms: u64,
    }

    impl SensorEvent {
        /// Derive the event from a processed reading
        pub fn from_reading(reading: &Reading) -> Self {
            Self {
                name: reading.source_name.clone(),
                category: reading.category.to_string(),
                value: reading.processed_value,
                timestamp_ms: reading.timestamp_ms,
            }
        }
    }

    impl EventData for SensorEvent {
        fn event_type() -> &'static str {
            SENSOR_READING
        }
    }

    /// Data for DEVICE_STATE_CHANGED events
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct DeviceEvent {
        pub device_id: String,
        /// Name of the trigger that caused the transition
        pub action: String,
        pub previous_state: String,
        pub new_state: String,
    }

    impl EventData for DeviceEvent {
        fn event_type() -> &'static str {
            DEVICE_STATE_CHANGED
        }
    }

    /// Alert severity
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
    #[serde(into = "u8", try_from = "u8")]
    pub enum AlertSeverity {
        Low = 1,
        Medium = 2,
        High = 3,
    }

    impl AlertSeverity {
        /// Map a rule's alert level to a severity; 0 means "no alert"
        pub fn from_level(level: u8) -> Option<Self> {
            match level {
                1 => Some(AlertSeverity::Low),
                2 => Some(AlertSeverity::Medium),
                3 => Some(AlertSeverity::High),
                _ => None,
            }
        }

        pub fn level(self) -> u8 {
            self as u8
        }
    }

    impl From<AlertSeverity> for u8 {
        fn from(severity: AlertSeverity) -> Self {
            severity.level()
        }
    }

    impl TryFrom<u8> for AlertSeverity {
        type Error = String;

        fn try_from(level: u8) -> Result<Self, Self::Error> {
            Self::from_level(level).ok_or_else(|| format!("invalid alert severity: {level}"))
        }
    }

    /// Data for ALERT events
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct AlertEvent {
        pub source: String,
        pub message: String,
        pub severity: AlertSeverity,
    }

    impl EventData for AlertEvent {
        fn event_type() -> &'static str {
            ALERT
        }
    }
}
