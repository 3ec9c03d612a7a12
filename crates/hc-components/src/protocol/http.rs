//! Simulated HTTP client

use hc_config::HttpConfig;
use std::collections::HashMap;
use tracing::{debug, error, info};

use super::{MessageCallback, Protocol};

const ACCEPTED: &str = r#"{"status":"accepted"}"#;
const OK: &str = r#"{"status":"ok","code":200}"#;
const NO_DATA: &str = r#"{"status":"no_data"}"#;

/// HTTP client that records the last response per endpoint
pub struct HttpClient {
    config: HttpConfig,
    connected: bool,
    responses: HashMap<String, String>,
    callback: Option<MessageCallback>,
}

impl HttpClient {
    pub fn new(config: HttpConfig) -> Self {
        Self {
            config,
            connected: false,
            responses: HashMap::new(),
            callback: None,
        }
    }

    pub fn config(&self) -> &HttpConfig {
        &self.config
    }

    /// Full URL for an endpoint
    pub fn url(&self, endpoint: &str) -> String {
        format!(
            "{}:{}/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.port,
            endpoint.trim_start_matches('/')
        )
    }
}

impl Protocol for HttpClient {
    fn connect(&mut self) -> bool {
        info!(
            "HTTP connecting to {}:{}",
            self.config.base_url, self.config.port
        );
        self.connected = true;
        info!(
            "HTTP connected (timeout={}ms, retries={})",
            self.config.timeout_ms, self.config.retry_count
        );
        true
    }

    fn disconnect(&mut self) {
        if !self.connected {
            return;
        }
        info!("HTTP disconnecting");
        self.connected = false;
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn send(&mut self, endpoint: &str, payload: &str) -> bool {
        if !self.connected {
            error!("HTTP not connected, cannot POST to: {}", endpoint);
            return false;
        }

        debug!(
            "HTTP POST {} payload_size={} auth={}",
            self.url(endpoint),
            payload.len(),
            if self.config.api_key.is_empty() { "none" } else { "Bearer[...]" }
        );
        self.responses.insert(endpoint.to_string(), OK.to_string());
        if let Some(callback) = &self.callback {
            callback(endpoint, ACCEPTED);
        }
        true
    }

    fn receive(&mut self, endpoint: &str) -> Option<String> {
        if !self.connected {
            return None;
        }
        debug!("HTTP GET {}", self.url(endpoint));
        Some(
            self.responses
                .get(endpoint)
                .cloned()
                .unwrap_or_else(|| NO_DATA.to_string()),
        )
    }

    fn set_message_callback(&mut self, callback: MessageCallback) {
        self.callback = Some(callback);
    }

    fn name(&self) -> String {
        "HTTP".to_string()
    }
}

impl Drop for HttpClient {
    fn drop(&mut self) {
        self.disconnect();
    }
}
