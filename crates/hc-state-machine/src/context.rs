//! Per-device state holder

use hc_core::events::DeviceEvent;
use hc_core::DeviceStateType;
use hc_event_bus::EventBus;
use parking_lot::{Mutex, RwLock};
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::error::{StateError, StateResult};
use crate::transition::{next_state, DeviceTrigger, Transition};

/// DeviceEvents waiting to be published, in transition order
#[derive(Default)]
struct Outbox {
    queue: VecDeque<DeviceEvent>,
    /// Set while some thread is publishing the queue
    draining: bool,
}

/// Holds one device's current state and applies triggers to it
///
/// Transitions on the same device are serialized. Each committed transition
/// queues a [`DeviceEvent`]; the queue is published with no lock held, and
/// always in the order the transitions happened.
pub struct DeviceContext {
    device_id: String,
    state: RwLock<DeviceStateType>,
    outbox: Mutex<Outbox>,
    bus: Arc<EventBus>,
}

impl DeviceContext {
    /// Create a device in the Idle state
    pub fn new(device_id: impl Into<String>, bus: Arc<EventBus>) -> Self {
        let device_id = device_id.into();
        on_enter(&device_id, DeviceStateType::Idle);
        Self {
            device_id,
            state: RwLock::new(DeviceStateType::Idle),
            outbox: Mutex::new(Outbox::default()),
            bus,
        }
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn current_state(&self) -> DeviceStateType {
        *self.state.read()
    }

    /// Apply a trigger and publish the resulting DeviceEvent
    ///
    /// A trigger not accepted in the current state leaves it unchanged and
    /// publishes nothing.
    pub fn handle_event(&self, trigger: DeviceTrigger) -> StateResult<Transition> {
        let transition = self.apply(trigger)?;
        self.publish_pending();
        Ok(transition)
    }

    /// Apply a trigger without publishing
    ///
    /// The DeviceEvent stays queued until [`publish_pending`] runs. Callers
    /// holding their own locks use this to publish after releasing them.
    ///
    /// [`publish_pending`]: DeviceContext::publish_pending
    pub fn apply(&self, trigger: DeviceTrigger) -> StateResult<Transition> {
        let mut state = self.state.write();
        let from = *state;
        let Some(to) = next_state(from, trigger) else {
            warn!(
                device_id = %self.device_id,
                "Cannot {} device in {} state",
                trigger,
                from
            );
            return Err(StateError::InvalidTransition {
                device_id: self.device_id.clone(),
                from,
                trigger,
            });
        };

        on_exit(&self.device_id, from);
        *state = to;
        on_enter(&self.device_id, to);
        info!(device_id = %self.device_id, "State transition: {} -> {}", from, to);

        // queued under the state lock so queue order is transition order
        self.outbox.lock().queue.push_back(DeviceEvent {
            device_id: self.device_id.clone(),
            action: trigger.as_str().to_string(),
            previous_state: from.to_string(),
            new_state: to.to_string(),
        });

        Ok(Transition { trigger, from, to })
    }

    /// Publish queued DeviceEvents
    ///
    /// If another caller is already publishing, that caller delivers the
    /// queued events and this returns immediately. The same holds for a
    /// handler that transitions the device while its event is delivered.
    pub fn publish_pending(&self) {
        {
            let mut outbox = self.outbox.lock();
            if outbox.draining {
                return;
            }
            outbox.draining = true;
        }

        loop {
            let next = {
                let mut outbox = self.outbox.lock();
                match outbox.queue.pop_front() {
                    Some(event) => event,
                    None => {
                        outbox.draining = false;
                        return;
                    }
                }
            };
            self.bus.publish_typed(next);
        }
    }

    /// Apply a trigger given by name
    pub fn handle_event_str(&self, trigger: &str) -> StateResult<Transition> {
        self.handle_event(trigger.parse()?)
    }
}

impl std::fmt::Debug for DeviceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceContext")
            .field("device_id", &self.device_id)
            .field("state", &self.current_state())
            .finish()
    }
}

fn on_enter(device_id: &str, state: DeviceStateType) {
    match state {
        DeviceStateType::Error => error!(device_id, "Device entered ERROR state"),
        DeviceStateType::Maintenance => info!(device_id, "Maintenance window started"),
        _ => debug!(device_id, "Entered {} state", state),
    }
}

fn on_exit(device_id: &str, state: DeviceStateType) {
    match state {
        DeviceStateType::Maintenance => info!(device_id, "Maintenance window finished"),
        _ => debug!(device_id, "Leaving {} state", state),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hc_core::{Event, EventData};
    use parking_lot::Mutex;

    fn recorder(bus: &EventBus) -> Arc<Mutex<Vec<DeviceEvent>>> {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        bus.subscribe_typed(move |event: &Event<DeviceEvent>| {
            sink.lock().push(event.data.clone());
        });
        events
    }

    #[test]
    fn test_starts_idle() {
        let device = DeviceContext::new("fan_01", Arc::new(EventBus::new()));
        assert_eq!(device.current_state(), DeviceStateType::Idle);
        assert_eq!(device.device_id(), "fan_01");
    }

    #[test]
    fn test_transition_publishes_device_event() {
        let bus = Arc::new(EventBus::new());
        let events = recorder(&bus);
        let device = DeviceContext::new("fan_01", bus);

        let transition = device.handle_event(DeviceTrigger::Activate).unwrap();
        assert_eq!(transition.from, DeviceStateType::Idle);
        assert_eq!(transition.to, DeviceStateType::Active);
        assert_eq!(device.current_state(), DeviceStateType::Active);

        let events = events.lock();
        assert_eq!(events.len(), 1);
        assert_eq!(
            events[0],
            DeviceEvent {
                device_id: "fan_01".to_string(),
                action: "activate".to_string(),
                previous_state: "Idle".to_string(),
                new_state: "Active".to_string(),
            }
        );
    }

    #[test]
    fn test_rejected_trigger_is_silent() {
        let bus = Arc::new(EventBus::new());
        let events = recorder(&bus);
        let device = DeviceContext::new("fan_01", bus);

        let err = device.handle_event(DeviceTrigger::Deactivate).unwrap_err();
        assert_eq!(
            err,
            StateError::InvalidTransition {
                device_id: "fan_01".to_string(),
                from: DeviceStateType::Idle,
                trigger: DeviceTrigger::Deactivate,
            }
        );
        assert_eq!(device.current_state(), DeviceStateType::Idle);
        assert!(events.lock().is_empty());
    }

    #[test]
    fn test_error_and_reset_cycle() {
        let device = DeviceContext::new("alarm_01", Arc::new(EventBus::new()));
        device.handle_event_str("activate").unwrap();
        device.handle_event_str("error").unwrap();
        assert_eq!(device.current_state(), DeviceStateType::Error);
        assert!(device.handle_event_str("activate").is_err());
        device.handle_event_str("reset").unwrap();
        assert_eq!(device.current_state(), DeviceStateType::Idle);
    }

    #[test]
    fn test_maintenance_from_error() {
        let device = DeviceContext::new("alarm_01", Arc::new(EventBus::new()));
        device.handle_event(DeviceTrigger::Activate).unwrap();
        device.handle_event(DeviceTrigger::Error).unwrap();
        device.handle_event(DeviceTrigger::Maintenance).unwrap();
        assert_eq!(device.current_state(), DeviceStateType::Maintenance);
        device.handle_event(DeviceTrigger::Done).unwrap();
        assert_eq!(device.current_state(), DeviceStateType::Idle);
    }

    #[test]
    fn test_unknown_trigger_name() {
        let device = DeviceContext::new("fan_01", Arc::new(EventBus::new()));
        assert_eq!(
            device.handle_event_str("fly"),
            Err(StateError::UnknownTrigger("fly".to_string()))
        );
    }

    #[test]
    fn test_subscriber_can_read_new_state() {
        let bus = Arc::new(EventBus::new());
        let device = Arc::new(DeviceContext::new("fan_01", bus.clone()));
        let seen = Arc::new(Mutex::new(None));

        let probe = device.clone();
        let sink = seen.clone();
        bus.subscribe(DeviceEvent::event_type(), move |_: &Event<DeviceEvent>| {
            *sink.lock() = Some(probe.current_state());
        });

        device.handle_event(DeviceTrigger::Activate).unwrap();
        assert_eq!(*seen.lock(), Some(DeviceStateType::Active));
    }

    #[test]
    fn test_apply_defers_event_until_published() {
        let bus = Arc::new(EventBus::new());
        let events = recorder(&bus);
        let device = DeviceContext::new("fan_01", bus);

        device.apply(DeviceTrigger::Activate).unwrap();
        device.apply(DeviceTrigger::Deactivate).unwrap();
        assert!(events.lock().is_empty());
        assert!(device.apply(DeviceTrigger::Done).is_err());

        device.publish_pending();
        let actions: Vec<String> = events.lock().iter().map(|e| e.action.clone()).collect();
        assert_eq!(actions, vec!["activate", "deactivate"]);
    }

    #[test]
    fn test_handler_can_transition_same_device() {
        let bus = Arc::new(EventBus::new());
        let device = Arc::new(DeviceContext::new("alarm_01", bus.clone()));
        let events = recorder(&bus);

        let inner = device.clone();
        bus.subscribe_typed(move |event: &Event<DeviceEvent>| {
            if event.data.new_state == "Active" {
                inner.handle_event(DeviceTrigger::Error).unwrap();
            }
        });

        device.handle_event(DeviceTrigger::Activate).unwrap();
        assert_eq!(device.current_state(), DeviceStateType::Error);

        let chain: Vec<(String, String)> = events
            .lock()
            .iter()
            .map(|e| (e.previous_state.clone(), e.new_state.clone()))
            .collect();
        assert_eq!(
            chain,
            vec![
                ("Idle".to_string(), "Active".to_string()),
                ("Active".to_string(), "Error".to_string()),
            ]
        );
    }

    #[test]
    fn test_concurrent_transitions_form_a_chain() {
        let bus = Arc::new(EventBus::new());
        let events = recorder(&bus);
        let device = Arc::new(DeviceContext::new("fan_01", bus));

        let workers: Vec<_> = (0..4)
            .map(|offset| {
                let device = device.clone();
                std::thread::spawn(move || {
                    for i in 0..300 {
                        let trigger = DeviceTrigger::ALL[(i + offset) % DeviceTrigger::ALL.len()];
                        let _ = device.handle_event(trigger);
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        let events = events.lock();
        assert!(!events.is_empty());
        assert_eq!(events[0].previous_state, "Idle");
        for pair in events.windows(2) {
            assert_eq!(pair[1].previous_state, pair[0].new_state);
        }
        assert_eq!(
            events.last().unwrap().new_state,
            device.current_state().to_string()
        );
    }
}
