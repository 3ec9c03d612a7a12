//! Topic and payload adaptation over another protocol

use hc_core::now_ms;
use serde_json::{json, Value};
use tracing::{debug, info};

use super::{MessageCallback, Protocol};

/// Prefixes topics and wraps payloads in a timestamped envelope
///
/// `send("DHT22_Temp", p)` becomes `send("<prefix>/DHT22_Temp",
/// {"timestamp": <ms>, "data": p})` on the wrapped protocol.
pub struct ProtocolAdapter {
    inner: Box<dyn Protocol>,
    topic_prefix: String,
}

impl ProtocolAdapter {
    pub fn new(inner: Box<dyn Protocol>, topic_prefix: impl Into<String>) -> Self {
        Self {
            inner,
            topic_prefix: topic_prefix.into(),
        }
    }

    pub fn set_topic_prefix(&mut self, prefix: impl Into<String>) {
        self.topic_prefix = prefix.into();
    }

    pub fn inner(&self) -> &dyn Protocol {
        self.inner.as_ref()
    }

    pub fn inner_mut(&mut self) -> &mut dyn Protocol {
        self.inner.as_mut()
    }

    pub fn format_topic(&self, topic: &str) -> String {
        if self.topic_prefix.is_empty() {
            topic.to_string()
        } else {
            format!("{}/{}", self.topic_prefix, topic)
        }
    }

    /// Wrap a payload; non-JSON payloads are embedded as strings
    pub fn wrap_payload(&self, payload: &str) -> String {
        let data = serde_json::from_str::<Value>(payload)
            .unwrap_or_else(|_| Value::String(payload.to_string()));
        json!({ "timestamp": now_ms(), "data": data }).to_string()
    }
}

impl Protocol for ProtocolAdapter {
    fn connect(&mut self) -> bool {
        info!("ProtocolAdapter connecting via {}", self.inner.name());
        self.inner.connect()
    }

    fn disconnect(&mut self) {
        self.inner.disconnect();
    }

    fn is_connected(&self) -> bool {
        self.inner.is_connected()
    }

    fn send(&mut self, topic: &str, payload: &str) -> bool {
        let topic = self.format_topic(topic);
        let payload = self.wrap_payload(payload);
        debug!("Adapted SEND [{}]", topic);
        self.inner.send(&topic, &payload)
    }

    fn receive(&mut self, topic: &str) -> Option<String> {
        let topic = self.format_topic(topic);
        self.inner.receive(&topic)
    }

    fn set_message_callback(&mut self, callback: MessageCallback) {
        self.inner.set_message_callback(callback);
    }

    fn name(&self) -> String {
        format!("Adapted({})", self.inner.name())
    }
}
