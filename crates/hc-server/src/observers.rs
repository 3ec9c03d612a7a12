//! Logging observers for device and alert events

use hc_core::events::{AlertEvent, AlertSeverity, DeviceEvent};
use hc_core::Event;
use hc_event_bus::{EventBus, SubscriptionId};
use tracing::{info, warn};

pub fn severity_label(severity: AlertSeverity) -> &'static str {
    match severity {
        AlertSeverity::High => "HIGH",
        AlertSeverity::Medium => "MED",
        AlertSeverity::Low => "LOW",
    }
}

/// Log every device transition at info and every alert at warn
pub fn install(bus: &EventBus) -> [SubscriptionId; 2] {
    let devices = bus.subscribe_typed(|event: &Event<DeviceEvent>| {
        let change = &event.data;
        info!(
            device_id = %change.device_id,
            "[DEVICE] {}: {} -> {} ({})",
            change.device_id,
            change.previous_state,
            change.new_state,
            change.action
        );
    });

    let alerts = bus.subscribe_typed(|event: &Event<AlertEvent>| {
        let alert = &event.data;
        warn!(
            context = %event.context.id,
            "[ALERT:{}] {}: {}",
            severity_label(alert.severity),
            alert.source,
            alert.message
        );
    });

    [devices, alerts]
}
