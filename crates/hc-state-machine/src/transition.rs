//! Device transition table
//!
//! ```text
//! Idle ──activate──▶ Active ──deactivate──▶ Idle
//!   │                  │ └──error──▶ Error ──reset──▶ Idle
//!   └──maintenance──▶ Maintenance ◀──maintenance── (Active, Error)
//!                      └──done──▶ Idle
//! ```

use hc_core::DeviceStateType;
use std::fmt;
use std::str::FromStr;

use crate::error::StateError;

/// Event names accepted by a device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceTrigger {
    Activate,
    Deactivate,
    Error,
    Maintenance,
    Done,
    Reset,
}

impl DeviceTrigger {
    pub const ALL: [DeviceTrigger; 6] = [
        DeviceTrigger::Activate,
        DeviceTrigger::Deactivate,
        DeviceTrigger::Error,
        DeviceTrigger::Maintenance,
        DeviceTrigger::Done,
        DeviceTrigger::Reset,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DeviceTrigger::Activate => "activate",
            DeviceTrigger::Deactivate => "deactivate",
            DeviceTrigger::Error => "error",
            DeviceTrigger::Maintenance => "maintenance",
            DeviceTrigger::Done => "done",
            DeviceTrigger::Reset => "reset",
        }
    }
}

impl fmt::Display for DeviceTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeviceTrigger {
    type Err = StateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| StateError::UnknownTrigger(s.to_string()))
    }
}

/// Target state for `trigger` in `from`, or `None` when the pair is not listed
pub fn next_state(from: DeviceStateType, trigger: DeviceTrigger) -> Option<DeviceStateType> {
    use DeviceStateType::*;
    use DeviceTrigger as T;

    match (from, trigger) {
        (Idle, T::Activate) => Some(Active),
        (Idle, T::Maintenance) => Some(Maintenance),

        (Active, T::Deactivate) => Some(Idle),
        (Active, T::Error) => Some(Error),
        (Active, T::Maintenance) => Some(Maintenance),

        (Error, T::Reset) => Some(Idle),
        (Error, T::Maintenance) => Some(Maintenance),

        (Maintenance, T::Done) => Some(Idle),

        _ => None,
    }
}

/// Check if a trigger is accepted without performing it
pub fn accepts(from: DeviceStateType, trigger: DeviceTrigger) -> bool {
    next_state(from, trigger).is_some()
}

/// A committed state change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub trigger: DeviceTrigger,
    pub from: DeviceStateType,
    pub to: DeviceStateType,
}

#[cfg(test)]
mod tests {
    use super::*;
    use DeviceStateType::*;

    #[test]
    fn test_full_table() {
        let expected = [
            (Idle, [Some(Active), None, None, Some(Maintenance), None, None]),
            (Active, [None, Some(Idle), Some(Error), Some(Maintenance), None, None]),
            (Error, [None, None, None, Some(Maintenance), None, Some(Idle)]),
            (Maintenance, [None, None, None, None, Some(Idle), None]),
        ];

        for (state, row) in expected {
            for (trigger, target) in DeviceTrigger::ALL.into_iter().zip(row) {
                assert_eq!(
                    next_state(state, trigger),
                    target,
                    "{state} on {trigger}"
                );
            }
        }
    }

    #[test]
    fn test_parse_trigger() {
        for trigger in DeviceTrigger::ALL {
            assert_eq!(trigger.as_str().parse::<DeviceTrigger>().unwrap(), trigger);
        }
        assert_eq!(
            "explode".parse::<DeviceTrigger>(),
            Err(StateError::UnknownTrigger("explode".to_string()))
        );
    }

    #[test]
    fn test_accepts() {
        assert!(accepts(Idle, DeviceTrigger::Activate));
        assert!(!accepts(Idle, DeviceTrigger::Deactivate));
    }
}
