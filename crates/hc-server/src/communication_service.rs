//! Forwards sensor readings to the configured transport

use hc_components::{ComponentResult, Protocol, ProtocolFactory};
use hc_config::CommunicationConfig;
use hc_core::events::SensorEvent;
use hc_core::{Event, EventData};
use hc_event_bus::{EventBus, SubscriptionId};
use parking_lot::Mutex;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Publishes every `sensor.reading` event under the sensor's name
pub struct CommunicationService {
    bus: Arc<EventBus>,
    protocol: Arc<Mutex<Box<dyn Protocol>>>,
    subscription: Mutex<Option<SubscriptionId>>,
}

impl CommunicationService {
    pub fn new(bus: Arc<EventBus>, protocol: Box<dyn Protocol>) -> Self {
        Self {
            bus,
            protocol: Arc::new(Mutex::new(protocol)),
            subscription: Mutex::new(None),
        }
    }

    pub fn from_config(bus: Arc<EventBus>, config: &CommunicationConfig) -> ComponentResult<Self> {
        Ok(Self::new(bus, ProtocolFactory::from_config(config)?))
    }

    pub fn protocol_name(&self) -> String {
        self.protocol.lock().name()
    }

    pub fn is_connected(&self) -> bool {
        self.protocol.lock().is_connected()
    }

    /// Connect and start forwarding; returns false if the connection failed
    pub fn start(&self) -> bool {
        let mut protocol = self.protocol.lock();
        protocol.set_message_callback(Arc::new(|topic: &str, payload: &str| {
            debug!(topic, "Delivered {} bytes", payload.len());
        }));
        if !protocol.connect() {
            warn!("Failed to connect via {}", protocol.name());
            return false;
        }
        drop(protocol);

        let mut subscription = self.subscription.lock();
        if subscription.is_none() {
            let protocol = self.protocol.clone();
            *subscription = Some(self.bus.subscribe_typed(
                move |event: &Event<SensorEvent>| Self::forward(&protocol, &event.data),
            ));
        }

        info!("Communication service started ({})", self.protocol_name());
        true
    }

    /// Read back a message from the transport
    pub fn receive(&self, topic: &str) -> Option<String> {
        self.protocol.lock().receive(topic)
    }

    /// JSON body sent for a sensor event
    pub fn payload(event: &SensorEvent) -> String {
        json!({
            "sensor": event.name,
            "type": event.category,
            "value": event.value,
            "timestamp": event.timestamp_ms,
        })
        .to_string()
    }

    fn forward(protocol: &Mutex<Box<dyn Protocol>>, event: &SensorEvent) {
        let payload = Self::payload(event);
        let mut protocol = protocol.lock();
        if !protocol.send(&event.name, &payload) {
            warn!("Failed to send reading from {}", event.name);
        }
    }

    /// Stop forwarding and disconnect; safe to call more than once
    pub fn shutdown(&self) {
        if let Some(id) = self.subscription.lock().take() {
            self.bus.unsubscribe(SensorEvent::event_type(), id);
        }
        let mut protocol = self.protocol.lock();
        if protocol.is_connected() {
            protocol.disconnect();
            info!("Communication service stopped");
        }
    }
}

impl Drop for CommunicationService {
    fn drop(&mut self) {
        self.shutdown();
    }
}
