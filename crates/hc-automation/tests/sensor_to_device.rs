//! End-to-end flow: sensor event on the bus -> rule -> device command -> events

use hc_automation::{rules_from_config, AutomationEngine, Rule, RuleAction};
use hc_command::DeviceController;
use hc_config::DevicesConfig;
use hc_core::events::{AlertEvent, AlertSeverity, DeviceEvent, SensorEvent};
use hc_core::{Context, DeviceStateType, Event, SensorCategory};
use hc_event_bus::EventBus;
use parking_lot::Mutex;
use std::sync::Arc;

struct Harness {
    bus: Arc<EventBus>,
    controller: Arc<DeviceController>,
    engine: AutomationEngine,
    device_events: Arc<Mutex<Vec<DeviceEvent>>>,
    alerts: Arc<Mutex<Vec<Event<AlertEvent>>>>,
}

fn harness() -> Harness {
    let bus = Arc::new(EventBus::new());
    let controller = Arc::new(DeviceController::new(bus.clone()));
    controller.register_device("fan_01").unwrap();
    controller.register_device("alarm_01").unwrap();

    let device_events = Arc::new(Mutex::new(Vec::new()));
    let sink = device_events.clone();
    bus.subscribe_typed(move |e: &Event<DeviceEvent>| sink.lock().push(e.data.clone()));

    let alerts = Arc::new(Mutex::new(Vec::new()));
    let sink = alerts.clone();
    bus.subscribe_typed(move |e: &Event<AlertEvent>| sink.lock().push(e.clone()));

    let engine = AutomationEngine::new(bus.clone(), controller.clone());
    Harness {
        bus,
        controller,
        engine,
        device_events,
        alerts,
    }
}

fn reading(name: &str, category: &str, value: f64) -> SensorEvent {
    SensorEvent {
        name: name.to_string(),
        category: category.to_string(),
        value,
        timestamp_ms: 1,
    }
}

#[test]
fn test_high_temperature_activates_fan_once() {
    let h = harness();
    h.engine
        .add_rule(
            Rule::above(
                "HighTemp_ActivateFan",
                SensorCategory::Temperature,
                28.0,
                RuleAction::Activate,
                "fan_01",
            )
            .with_alert(2, "High temperature detected"),
        )
        .unwrap();
    h.engine.start_listening();

    h.bus.publish_typed(reading("DHT22_Temp", "Temperature", 30.0));
    h.bus.publish_typed(reading("DHT22_Temp", "Temperature", 30.0));

    assert_eq!(
        h.controller.device_state("fan_01").unwrap(),
        DeviceStateType::Active
    );
    assert_eq!(h.controller.command_history(), vec!["Activate fan_01"]);

    let device_events = h.device_events.lock();
    assert_eq!(device_events.len(), 1);
    assert_eq!(device_events[0].action, "activate");

    let alerts = h.alerts.lock();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].data.source, "HighTemp_ActivateFan");
    assert_eq!(
        alerts[0].data.message,
        "High temperature detected (value triggered rule)"
    );
    assert_eq!(alerts[0].data.severity, AlertSeverity::Medium);
}

#[test]
fn test_alert_context_points_at_sensor_event() {
    let h = harness();
    for rule in rules_from_config(&DevicesConfig::default()) {
        h.engine.add_rule(rule).unwrap();
    }
    h.engine.start_listening();

    let context = Context::new();
    h.bus
        .publish_typed_with_context(reading("PIR_Motion", "Motion", 1.0), context.clone());

    let alerts = h.alerts.lock();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].data.severity, AlertSeverity::High);
    assert_eq!(alerts[0].context.parent_id.as_deref(), Some(context.id.as_str()));
    assert_eq!(
        h.controller.device_state("alarm_01").unwrap(),
        DeviceStateType::Active
    );
}

#[test]
fn test_rules_without_alert_stay_quiet() {
    let h = harness();
    h.engine
        .add_rule(Rule::below(
            "Dry_StopFan",
            SensorCategory::Humidity,
            30.0,
            RuleAction::Deactivate,
            "fan_01",
        ))
        .unwrap();
    h.engine.start_listening();
    h.controller.activate("fan_01").unwrap();

    h.bus.publish_typed(reading("DHT22_Hum", "Humidity", 20.0));

    assert_eq!(
        h.controller.device_state("fan_01").unwrap(),
        DeviceStateType::Idle
    );
    assert!(h.alerts.lock().is_empty());
}

#[test]
fn test_shutdown_stops_reacting() {
    let h = harness();
    for rule in rules_from_config(&DevicesConfig::default()) {
        h.engine.add_rule(rule).unwrap();
    }
    h.engine.start_listening();
    h.engine.shutdown();

    h.bus.publish_typed(reading("DHT22_Temp", "Temperature", 45.0));
    assert!(h.device_events.lock().is_empty());
}

#[test]
fn test_undo_execute_redo_is_noop() {
    let h = harness();
    for rule in rules_from_config(&DevicesConfig::default()) {
        h.engine.add_rule(rule).unwrap();
    }
    h.engine.start_listening();

    h.bus.publish_typed(reading("DHT22_Temp", "Temperature", 35.0));
    h.controller.undo_last().unwrap();
    h.bus.publish_typed(reading("PIR_Motion", "Motion", 1.0));

    assert_eq!(h.controller.redo_last().unwrap(), None);
    assert_eq!(
        h.controller.device_state("fan_01").unwrap(),
        DeviceStateType::Idle
    );
    assert_eq!(
        h.controller.device_state("alarm_01").unwrap(),
        DeviceStateType::Active
    );
}
