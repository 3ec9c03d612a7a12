//! Transport protocols
//!
//! Both clients are in-memory simulations: connecting always succeeds and
//! sent messages are looped back through the message callback.

mod adapter;
mod http;
mod mqtt;

pub use adapter::ProtocolAdapter;
pub use http::HttpClient;
pub use mqtt::MqttClient;

use hc_config::CommunicationConfig;
use std::sync::Arc;
use tracing::info;

use crate::error::{ComponentError, ComponentResult};

/// Called with `(topic, payload)` for every message the transport delivers
pub type MessageCallback = Arc<dyn Fn(&str, &str) + Send + Sync>;

/// A message transport
pub trait Protocol: Send {
    fn connect(&mut self) -> bool;

    fn disconnect(&mut self);

    fn is_connected(&self) -> bool;

    /// Send a payload; returns false when not connected
    fn send(&mut self, topic: &str, payload: &str) -> bool;

    /// Fetch the next pending payload for a topic
    fn receive(&mut self, topic: &str) -> Option<String>;

    fn set_message_callback(&mut self, callback: MessageCallback);

    fn name(&self) -> String;
}

/// Builds protocols from the `communication:` section
pub struct ProtocolFactory;

impl ProtocolFactory {
    /// Create the bare client named by `config.protocol`
    pub fn create(config: &CommunicationConfig) -> ComponentResult<Box<dyn Protocol>> {
        match config.protocol.to_ascii_lowercase().as_str() {
            "mqtt" => Ok(Box::new(MqttClient::new(config.mqtt.clone()))),
            "http" => Ok(Box::new(HttpClient::new(config.http.clone()))),
            other => Err(ComponentError::UnknownProtocol(other.to_string())),
        }
    }

    /// Create the configured client wrapped in a [`ProtocolAdapter`]
    pub fn from_config(config: &CommunicationConfig) -> ComponentResult<Box<dyn Protocol>> {
        info!("Creating protocol from config: {}", config.protocol);
        let inner = Self::create(config)?;
        Ok(Box::new(ProtocolAdapter::new(
            inner,
            config.mqtt.topic_prefix.clone(),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_builds_adapted_mqtt_by_default() {
        let protocol = ProtocolFactory::from_config(&CommunicationConfig::default()).unwrap();
        assert_eq!(protocol.name(), "Adapted(MQTT)");
    }

    #[test]
    fn test_factory_builds_http() {
        let config = CommunicationConfig {
            protocol: "HTTP".to_string(),
            ..CommunicationConfig::default()
        };
        assert_eq!(ProtocolFactory::create(&config).unwrap().name(), "HTTP");
    }

    #[test]
    fn test_factory_rejects_unknown() {
        let config = CommunicationConfig {
            protocol: "coap".to_string(),
            ..CommunicationConfig::default()
        };
        assert_eq!(
            ProtocolFactory::from_config(&config).err(),
            Some(ComponentError::UnknownProtocol("coap".to_string()))
        );
    }
}
