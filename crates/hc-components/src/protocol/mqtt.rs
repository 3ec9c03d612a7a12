//! Simulated MQTT client

use hc_config::MqttConfig;
use std::collections::VecDeque;
use tracing::{debug, error, info};

use super::{MessageCallback, Protocol};

/// MQTT client that queues published messages locally
///
/// At most `max_pending` undelivered messages are kept; the oldest is
/// dropped to make room.
pub struct MqttClient {
    config: MqttConfig,
    connected: bool,
    queue: VecDeque<(String, String)>,
    subscriptions: Vec<String>,
    callback: Option<MessageCallback>,
}

impl MqttClient {
    pub fn new(config: MqttConfig) -> Self {
        Self {
            config,
            connected: false,
            queue: VecDeque::new(),
            subscriptions: Vec::new(),
            callback: None,
        }
    }

    pub fn config(&self) -> &MqttConfig {
        &self.config
    }

    /// Record interest in a topic
    pub fn subscribe(&mut self, topic: impl Into<String>) {
        let topic = topic.into();
        info!("MQTT SUBSCRIBE [{}]", topic);
        self.subscriptions.push(topic);
    }

    pub fn subscriptions(&self) -> &[String] {
        &self.subscriptions
    }

    /// Messages published but not yet received
    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

impl Protocol for MqttClient {
    fn connect(&mut self) -> bool {
        info!(
            "MQTT connecting to {}:{} (client={})",
            self.config.broker_host, self.config.broker_port, self.config.client_id
        );
        self.connected = true;
        info!(
            "MQTT connected (QoS={}, KeepAlive={}s)",
            self.config.qos, self.config.keepalive_sec
        );
        true
    }

    fn disconnect(&mut self) {
        if !self.connected {
            return;
        }
        info!("MQTT disconnecting from {}", self.config.broker_host);
        self.connected = false;
        self.subscriptions.clear();
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn send(&mut self, topic: &str, payload: &str) -> bool {
        if !self.connected {
            error!("MQTT not connected, cannot publish to: {}", topic);
            return false;
        }

        debug!(
            "MQTT PUBLISH [{}] QoS={} payload_size={}",
            topic,
            self.config.qos,
            payload.len()
        );
        if self.queue.len() >= self.config.max_pending.max(1) {
            if let Some((dropped, _)) = self.queue.pop_front() {
                debug!("MQTT queue full, dropping oldest message for [{}]", dropped);
            }
        }
        self.queue.push_back((topic.to_string(), payload.to_string()));
        if let Some(callback) = &self.callback {
            callback(topic, payload);
        }
        true
    }

    fn receive(&mut self, topic: &str) -> Option<String> {
        let index = self.queue.iter().position(|(t, _)| t == topic)?;
        self.queue.remove(index).map(|(_, payload)| payload)
    }

    fn set_message_callback(&mut self, callback: MessageCallback) {
        self.callback = Some(callback);
    }

    fn name(&self) -> String {
        "MQTT".to_string()
    }
}

impl Drop for MqttClient {
    fn drop(&mut self) {
        self.disconnect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_send_requires_connection() {
        let mut client = MqttClient::new(MqttConfig::default());
        assert!(!client.send("t", "p"));
        assert_eq!(client.pending(), 0);
    }

    #[test]
    fn test_send_queues_and_calls_back() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();

        let mut client = MqttClient::new(MqttConfig::default());
        client.set_message_callback(Arc::new(move |topic: &str, payload: &str| {
            sink.lock().unwrap().push(format!("{topic}:{payload}"));
        }));
        assert!(client.connect());
        assert!(client.send("home/a", "1"));
        assert!(client.send("home/b", "2"));

        assert_eq!(*seen.lock().unwrap(), vec!["home/a:1", "home/b:2"]);
        assert_eq!(client.receive("home/b"), Some("2".to_string()));
        assert_eq!(client.receive("home/b"), None);
        assert_eq!(client.receive("home/a"), Some("1".to_string()));
    }

    #[test]
    fn test_disconnect_clears_subscriptions() {
        let mut client = MqttClient::new(MqttConfig::default());
        client.connect();
        client.subscribe("home/#");
        assert_eq!(client.subscriptions(), ["home/#".to_string()]);

        client.disconnect();
        assert!(!client.is_connected());
        assert!(client.subscriptions().is_empty());
    }

    #[test]
    fn test_queue_is_bounded() {
        let mut client = MqttClient::new(MqttConfig {
            max_pending: 3,
            ..MqttConfig::default()
        });
        client.connect();
        for i in 0..10 {
            assert!(client.send("home/a", &i.to_string()));
            assert!(client.pending() <= 3);
        }

        assert_eq!(client.pending(), 3);
        assert_eq!(client.receive("home/a"), Some("7".to_string()));
        assert_eq!(client.receive("home/a"), Some("8".to_string()));
        assert_eq!(client.receive("home/a"), Some("9".to_string()));
        assert_eq!(client.receive("home/a"), None);
    }
}
