//! Sensor readings and categories

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when a category name cannot be mapped to a [`SensorCategory`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown sensor category: {0}")]
pub struct UnknownCategory(pub String);

/// Kind of physical quantity a sensor observes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SensorCategory {
    Temperature,
    Humidity,
    Motion,
}

impl SensorCategory {
    /// All known categories, in declaration order
    pub const ALL: [SensorCategory; 3] = [
        SensorCategory::Temperature,
        SensorCategory::Humidity,
        SensorCategory::Motion,
    ];

    /// Display name, e.g. `"Temperature"`
    pub fn as_str(self) -> &'static str {
        match self {
            SensorCategory::Temperature => "Temperature",
            SensorCategory::Humidity => "Humidity",
            SensorCategory::Motion => "Motion",
        }
    }
}

impl std::fmt::Display for SensorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SensorCategory {
    type Err = UnknownCategory;

    /// Parse a category name (case-insensitive)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "temperature" => Ok(SensorCategory::Temperature),
            "humidity" => Ok(SensorCategory::Humidity),
            "motion" => Ok(SensorCategory::Motion),
            _ => Err(UnknownCategory(s.to_string())),
        }
    }
}

/// One sensor observation, before or after pipeline processing
///
/// Pipeline stages may only rewrite `processed_value` and `valid`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    #[serde(rename = "sensor")]
    pub source_name: String,

    #[serde(rename = "type")]
    pub category: SensorCategory,

    #[serde(rename = "raw")]
    pub raw_value: f64,

    #[serde(rename = "value")]
    pub processed_value: f64,

    #[serde(rename = "timestamp")]
    pub timestamp_ms: u64,

    pub valid: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

impl Reading {
    /// Create a valid reading whose processed value starts at the raw value
    pub fn new(source_name: impl Into<String>, category: SensorCategory, raw_value: f64) -> Self {
        Self {
            source_name: source_name.into(),
            category,
            raw_value,
            processed_value: raw_value,
            timestamp_ms: now_ms(),
            valid: true,
            unit: None,
        }
    }

    /// Set the unit label
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    /// Override the timestamp
    pub fn with_timestamp(mut self, timestamp_ms: u64) -> Self {
        self.timestamp_ms = timestamp_ms;
        self
    }

    /// Mark the reading as invalid
    pub fn invalidated(mut self) -> Self {
        self.valid = false;
        self
    }

    /// Serialize to the JSON object shared with transport collaborators
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Milliseconds since the Unix epoch
pub fn now_ms() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or_default()
}
