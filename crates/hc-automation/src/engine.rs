//! Rule evaluation engine
//!
//! Listens for `sensor.reading` events, matches them against the registered
//! rules and drives the target devices through the [`DeviceController`].

use hc_command::{CommandError, DeviceController};
use hc_core::events::{AlertEvent, AlertSeverity, SensorEvent};
use hc_core::{Context, Event, EventData, SensorCategory};
use hc_event_bus::{EventBus, SubscriptionId};
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::error::AutomationResult;
use crate::rule::Rule;

/// Matches sensor events against rules and issues device commands
pub struct AutomationEngine {
    /// Event bus for sensor events and alerts
    event_bus: Arc<EventBus>,
    /// Devices targeted by rules
    controller: Arc<DeviceController>,
    /// Registered rules, in registration order
    rules: Arc<RwLock<Vec<Rule>>>,
    /// Listening flag
    running: Arc<AtomicBool>,
    /// Active sensor subscription
    subscription: Mutex<Option<SubscriptionId>>,
}

impl AutomationEngine {
    pub fn new(event_bus: Arc<EventBus>, controller: Arc<DeviceController>) -> Self {
        Self {
            event_bus,
            controller,
            rules: Arc::new(RwLock::new(Vec::new())),
            running: Arc::new(AtomicBool::new(false)),
            subscription: Mutex::new(None),
        }
    }

    /// Register a rule; rules cannot be removed
    pub fn add_rule(&self, rule: Rule) -> AutomationResult<()> {
        rule.validate()?;
        info!("Rule added: {}", rule);
        self.rules.write().push(rule);
        Ok(())
    }

    pub fn rule_count(&self) -> usize {
        self.rules.read().len()
    }

    pub fn rule_names(&self) -> Vec<String> {
        self.rules.read().iter().map(|r| r.name.clone()).collect()
    }

    pub fn is_listening(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Subscribe to sensor events
    ///
    /// Calling this again while listening does nothing.
    pub fn start_listening(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            debug!("Automation engine already listening");
            return;
        }

        let event_bus = self.event_bus.clone();
        let controller = self.controller.clone();
        let rules = self.rules.clone();

        let id = self
            .event_bus
            .subscribe_typed(move |event: &Event<SensorEvent>| {
                Self::process_event(event, &event_bus, &controller, &rules);
            });
        *self.subscription.lock() = Some(id);

        info!(
            "Automation engine listening for sensor events ({} rules)",
            self.rule_count()
        );
    }

    /// Stop listening; safe to call more than once
    pub fn shutdown(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        if let Some(id) = self.subscription.lock().take() {
            self.event_bus.unsubscribe(SensorEvent::event_type(), id);
        }
        info!("Automation engine stopped");
    }

    /// Evaluate one sensor event against every rule
    ///
    /// Returns the names of the rules whose action ran.
    pub fn evaluate(&self, event: &SensorEvent) -> Vec<String> {
        let event = Event::typed(event.clone(), Context::new());
        Self::process_event(&event, &self.event_bus, &self.controller, &self.rules)
    }

    #[instrument(
        level = "debug",
        skip_all,
        fields(sensor = %event.data.name, value = event.data.value)
    )]
    fn process_event(
        event: &Event<SensorEvent>,
        event_bus: &EventBus,
        controller: &DeviceController,
        rules: &RwLock<Vec<Rule>>,
    ) -> Vec<String> {
        let reading = &event.data;
        let category: SensorCategory = match reading.category.parse() {
            Ok(category) => category,
            Err(e) => {
                debug!("Ignoring sensor event: {}", e);
                return Vec::new();
            }
        };

        // Release the rule table before running commands
        let candidates: Vec<Rule> = rules
            .read()
            .iter()
            .filter(|rule| rule.category == category && rule.is_triggered(reading.value))
            .cloned()
            .collect();

        let mut fired = Vec::new();
        for rule in candidates {
            let state = match controller.device_state(&rule.target_device_id) {
                Ok(state) => state,
                Err(CommandError::UnknownDevice(id)) => {
                    warn!(rule = %rule.name, "Rule targets unknown device {}", id);
                    continue;
                }
                Err(e) => {
                    warn!(rule = %rule.name, "Cannot read device state: {}", e);
                    continue;
                }
            };

            if state != rule.action.required_state() {
                debug!(
                    rule = %rule.name,
                    "Device {} is {}, skipping {}",
                    rule.target_device_id,
                    state,
                    rule.action
                );
                continue;
            }

            warn!(
                "Rule [{}] triggered: {}={}",
                rule.name, reading.category, reading.value
            );

            let kind = rule.action.command_kind();
            if let Err(e) = controller.execute(&rule.target_device_id, kind) {
                warn!(rule = %rule.name, "Rule action failed: {}", e);
                continue;
            }

            if let Some(severity) = AlertSeverity::from_level(rule.alert_severity) {
                event_bus.publish_typed_with_context(
                    AlertEvent {
                        source: rule.name.clone(),
                        message: format!("{} (value triggered rule)", rule.alert_message),
                        severity,
                    },
                    event.context.child(),
                );
            }

            fired.push(rule.name);
        }

        fired
    }
}

impl Drop for AutomationEngine {
    fn drop(&mut self) {
        self.shutdown();
    }
}
