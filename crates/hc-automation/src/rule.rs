//! Automation rules

use hc_command::DeviceCommandKind;
use hc_config::DevicesConfig;
use hc_core::{DeviceStateType, SensorCategory};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{AutomationError, AutomationResult};

/// Device operation a rule performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleAction {
    Activate,
    Deactivate,
    Reset,
}

impl RuleAction {
    pub fn as_str(self) -> &'static str {
        match self {
            RuleAction::Activate => "activate",
            RuleAction::Deactivate => "deactivate",
            RuleAction::Reset => "reset",
        }
    }

    /// State the target device must be in for the action to run
    pub fn required_state(self) -> DeviceStateType {
        match self {
            RuleAction::Activate => DeviceStateType::Idle,
            RuleAction::Deactivate => DeviceStateType::Active,
            RuleAction::Reset => DeviceStateType::Error,
        }
    }

    pub fn command_kind(self) -> DeviceCommandKind {
        match self {
            RuleAction::Activate => DeviceCommandKind::Activate,
            RuleAction::Deactivate => DeviceCommandKind::Deactivate,
            RuleAction::Reset => DeviceCommandKind::Reset,
        }
    }
}

impl fmt::Display for RuleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RuleAction {
    type Err = AutomationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "activate" => Ok(RuleAction::Activate),
            "deactivate" => Ok(RuleAction::Deactivate),
            "reset" => Ok(RuleAction::Reset),
            _ => Err(AutomationError::UnknownAction(s.to_string())),
        }
    }
}

/// A threshold rule on one sensor category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub name: String,
    pub category: SensorCategory,
    pub threshold: f64,
    /// Fire when the value is strictly above (true) or strictly below (false)
    pub trigger_above: bool,
    pub target_device_id: String,
    pub action: RuleAction,
    /// 0 disables the alert, 1..=3 maps to Low..High
    #[serde(default)]
    pub alert_severity: u8,
    #[serde(default)]
    pub alert_message: String,
}

impl Rule {
    /// Rule firing when the value exceeds `threshold`
    pub fn above(
        name: impl Into<String>,
        category: SensorCategory,
        threshold: f64,
        action: RuleAction,
        target_device_id: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            category,
            threshold,
            trigger_above: true,
            target_device_id: target_device_id.into(),
            action,
            alert_severity: 0,
            alert_message: String::new(),
        }
    }

    /// Rule firing when the value drops below `threshold`
    pub fn below(
        name: impl Into<String>,
        category: SensorCategory,
        threshold: f64,
        action: RuleAction,
        target_device_id: impl Into<String>,
    ) -> Self {
        Self {
            trigger_above: false,
            ..Self::above(name, category, threshold, action, target_device_id)
        }
    }

    /// Publish an alert whenever the rule's action runs
    pub fn with_alert(mut self, severity: u8, message: impl Into<String>) -> Self {
        self.alert_severity = severity;
        self.alert_message = message.into();
        self
    }

    pub fn is_triggered(&self, value: f64) -> bool {
        if self.trigger_above {
            value > self.threshold
        } else {
            value < self.threshold
        }
    }

    pub fn validate(&self) -> AutomationResult<()> {
        let invalid = |reason: &str| AutomationError::InvalidRule {
            name: self.name.clone(),
            reason: reason.to_string(),
        };

        if self.name.trim().is_empty() {
            return Err(invalid("name must not be empty"));
        }
        if self.target_device_id.trim().is_empty() {
            return Err(invalid("target device must not be empty"));
        }
        if self.alert_severity > 3 {
            return Err(invalid("alert severity must be between 0 and 3"));
        }
        if !self.threshold.is_finite() {
            return Err(invalid("threshold must be a finite number"));
        }
        Ok(())
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} {} {} -> {} {})",
            self.name,
            self.category,
            if self.trigger_above { ">" } else { "<" },
            self.threshold,
            self.action,
            self.target_device_id
        )
    }
}

/// Default rules derived from the `devices:` configuration section
pub fn rules_from_config(devices: &DevicesConfig) -> Vec<Rule> {
    let mut rules = vec![Rule::above(
        "HighTemp_ActivateFan",
        SensorCategory::Temperature,
        devices.fan.auto_trigger_temp,
        RuleAction::Activate,
        devices.fan.id.clone(),
    )
    .with_alert(2, "High temperature detected")];

    if devices.alarm.motion_trigger {
        rules.push(
            Rule::above(
                "Motion_ActivateAlarm",
                SensorCategory::Motion,
                0.5,
                RuleAction::Activate,
                devices.alarm.id.clone(),
            )
            .with_alert(3, "Motion detected, intruder alert!"),
        );
    }

    rules
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trigger_direction_is_strict() {
        let hot = Rule::above("hot", SensorCategory::Temperature, 28.0, RuleAction::Activate, "fan");
        assert!(hot.is_triggered(28.1));
        assert!(!hot.is_triggered(28.0));

        let dry = Rule::below("dry", SensorCategory::Humidity, 30.0, RuleAction::Deactivate, "fan");
        assert!(dry.is_triggered(29.9));
        assert!(!dry.is_triggered(30.0));
    }

    #[test]
    fn test_validate() {
        let rule = Rule::above("ok", SensorCategory::Motion, 0.5, RuleAction::Activate, "alarm");
        assert!(rule.validate().is_ok());
        assert!(rule.clone().with_alert(4, "too loud").validate().is_err());

        let unnamed = Rule {
            name: " ".to_string(),
            ..rule.clone()
        };
        assert!(matches!(
            unnamed.validate(),
            Err(AutomationError::InvalidRule { .. })
        ));

        let nowhere = Rule {
            target_device_id: String::new(),
            ..rule
        };
        assert!(nowhere.validate().is_err());
    }

    #[test]
    fn test_action_guards() {
        assert_eq!(RuleAction::Activate.required_state(), DeviceStateType::Idle);
        assert_eq!(RuleAction::Deactivate.required_state(), DeviceStateType::Active);
        assert_eq!(RuleAction::Reset.required_state(), DeviceStateType::Error);
        assert_eq!("reset".parse::<RuleAction>().unwrap(), RuleAction::Reset);
        assert!("explode".parse::<RuleAction>().is_err());
    }

    #[test]
    fn test_default_rules() {
        let rules = rules_from_config(&DevicesConfig::default());
        assert_eq!(rules.len(), 2);

        assert_eq!(rules[0].name, "HighTemp_ActivateFan");
        assert_eq!(rules[0].threshold, 30.0);
        assert_eq!(rules[0].target_device_id, "fan_01");
        assert_eq!(rules[0].alert_severity, 2);

        assert_eq!(rules[1].name, "Motion_ActivateAlarm");
        assert_eq!(rules[1].category, SensorCategory::Motion);
        assert_eq!(rules[1].target_device_id, "alarm_01");
        assert_eq!(rules[1].alert_severity, 3);
    }

    #[test]
    fn test_motion_rule_disabled() {
        let mut devices = DevicesConfig::default();
        devices.alarm.motion_trigger = false;
        devices.fan.auto_trigger_temp = 26.5;

        let rules = rules_from_config(&devices);
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].threshold, 26.5);
    }

    #[test]
    fn test_rule_from_yaml() {
        let rule: Rule = serde_yaml::from_str(
            r#"
name: Dry_StopFan
category: Humidity
threshold: 25.0
trigger_above: false
target_device_id: fan_01
action: deactivate
"#,
        )
        .unwrap();

        assert_eq!(rule.action, RuleAction::Deactivate);
        assert_eq!(rule.alert_severity, 0);
        assert_eq!(rule.to_string(), "Dry_StopFan (Humidity < 25 -> deactivate fan_01)");
    }
}
