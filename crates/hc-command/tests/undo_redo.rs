//! Undo/redo behaviour of the device controller observed through the bus

use hc_command::DeviceController;
use hc_core::events::DeviceEvent;
use hc_core::{DeviceStateType, Event};
use hc_event_bus::EventBus;
use parking_lot::Mutex;
use std::sync::Arc;

fn setup() -> (Arc<EventBus>, DeviceController, Arc<Mutex<Vec<DeviceEvent>>>) {
    let bus = Arc::new(EventBus::new());
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    bus.subscribe_typed(move |event: &Event<DeviceEvent>| sink.lock().push(event.data.clone()));

    let controller = DeviceController::new(bus.clone());
    controller.register_device("fan_01").unwrap();
    controller.register_device("alarm_01").unwrap();
    (bus, controller, events)
}

fn states(controller: &DeviceController) -> Vec<DeviceStateType> {
    controller
        .device_ids()
        .iter()
        .map(|id| controller.device_state(id).unwrap())
        .collect()
}

#[test]
fn test_n_executes_then_n_undos_restore_every_device() {
    let (_bus, controller, _events) = setup();
    let initial = states(&controller);

    controller.activate("fan_01").unwrap();
    controller.activate("alarm_01").unwrap();
    controller.trigger_error("alarm_01").unwrap();
    controller.start_maintenance("alarm_01").unwrap();
    controller.deactivate("fan_01").unwrap();

    for _ in 0..5 {
        assert!(controller.undo_last().unwrap().is_some());
    }

    assert_eq!(states(&controller), initial);
    assert!(controller.command_history().is_empty());
}

#[test]
fn test_new_command_discards_redo() {
    let (_bus, controller, events) = setup();

    controller.activate("fan_01").unwrap();
    controller.undo_last().unwrap();
    controller.activate("alarm_01").unwrap();
    let published = events.lock().len();

    assert_eq!(controller.redo_last().unwrap(), None);
    assert_eq!(events.lock().len(), published);
    assert_eq!(
        controller.device_state("fan_01").unwrap(),
        DeviceStateType::Idle
    );
}

#[test]
fn test_undo_publishes_inverse_transition() {
    let (_bus, controller, events) = setup();

    controller.activate("fan_01").unwrap();
    controller.undo_last().unwrap();

    let events = events.lock();
    assert_eq!(events.len(), 2);
    assert_eq!(events[1].action, "deactivate");
    assert_eq!(events[1].previous_state, "Active");
    assert_eq!(events[1].new_state, "Idle");
}

#[test]
fn test_maintenance_round_trip() {
    let (_bus, controller, _events) = setup();

    controller.start_maintenance("fan_01").unwrap();
    controller.complete_maintenance("fan_01").unwrap();
    assert_eq!(
        controller.command_history(),
        vec!["Maintenance start fan_01", "Maintenance complete fan_01"]
    );

    controller.undo_last().unwrap();
    assert_eq!(
        controller.device_state("fan_01").unwrap(),
        DeviceStateType::Maintenance
    );
}
