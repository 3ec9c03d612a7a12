//! Device state identifiers

use serde::{Deserialize, Serialize};

/// The four states a device can be in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DeviceStateType {
    #[default]
    Idle,
    Active,
    Error,
    Maintenance,
}

impl DeviceStateType {
    pub fn as_str(self) -> &'static str {
        match self {
            DeviceStateType::Idle => "Idle",
            DeviceStateType::Active => "Active",
            DeviceStateType::Error => "Error",
            DeviceStateType::Maintenance => "Maintenance",
        }
    }
}

impl std::fmt::Display for DeviceStateType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
