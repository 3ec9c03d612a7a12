//! Typed homecore configuration
//!
//! Every section is optional; a missing key takes its default value.

use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::path::Path;
use tracing::{info, warn};

use crate::error::{ConfigError, ConfigResult};
use crate::loader::YamlLoader;

/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = "homecore.yaml";

/// Environment variable naming the configuration file
pub const CONFIG_PATH_ENV: &str = "HOMECORE_CONFIG";

/// Root configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub system: SystemConfig,
    pub sensors: SensorsConfig,
    pub pipeline: PipelineConfig,
    pub devices: DevicesConfig,
    pub communication: CommunicationConfig,
}

/// `system:` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    /// Log filter used when `RUST_LOG` is not set
    pub log_level: String,
    /// Number of sensor cycles to run; 0 runs until shutdown
    pub max_sensor_cycles: u64,
    /// Pause between sensor cycles
    pub cycle_interval_ms: u64,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            max_sensor_cycles: 0,
            cycle_interval_ms: 1000,
        }
    }
}

/// `sensors:` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorsConfig {
    pub temperature: SensorConfig,
    pub humidity: SensorConfig,
    pub motion: SensorConfig,
}

impl Default for SensorsConfig {
    fn default() -> Self {
        Self {
            temperature: SensorConfig::on_pin(4),
            humidity: SensorConfig::on_pin(4),
            motion: SensorConfig::on_pin(17),
        }
    }
}

/// A single sensor's settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    pub enabled: bool,
    pub pin: u32,
    pub calibration_offset: f64,
}

impl SensorConfig {
    fn on_pin(pin: u32) -> Self {
        Self {
            enabled: true,
            pin,
            calibration_offset: 0.0,
        }
    }
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self::on_pin(0)
    }
}

/// `pipeline:` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub threshold_min: f64,
    pub threshold_max: f64,
    /// One of `none`, `moving_average`, `exponential`, `threshold`
    pub filter_strategy: String,
    pub moving_average_window: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            threshold_min: 0.5,
            threshold_max: 100.0,
            filter_strategy: "moving_average".to_string(),
            moving_average_window: 5,
        }
    }
}

/// `devices:` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DevicesConfig {
    pub fan: FanConfig,
    pub alarm: AlarmConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FanConfig {
    pub id: String,
    /// Temperature above which the fan is switched on
    pub auto_trigger_temp: f64,
}

impl Default for FanConfig {
    fn default() -> Self {
        Self {
            id: "fan_01".to_string(),
            auto_trigger_temp: 30.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlarmConfig {
    pub id: String,
    /// Whether motion arms the alarm
    pub motion_trigger: bool,
}

impl Default for AlarmConfig {
    fn default() -> Self {
        Self {
            id: "alarm_01".to_string(),
            motion_trigger: true,
        }
    }
}

/// `communication:` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommunicationConfig {
    /// `mqtt` or `http`
    pub protocol: String,
    pub mqtt: MqttConfig,
    pub http: HttpConfig,
}

impl Default for CommunicationConfig {
    fn default() -> Self {
        Self {
            protocol: "mqtt".to_string(),
            mqtt: MqttConfig::default(),
            http: HttpConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MqttConfig {
    pub broker_host: String,
    pub broker_port: u16,
    pub client_id: String,
    pub qos: u8,
    pub keepalive_sec: u32,
    pub topic_prefix: String,
    /// Undelivered messages kept before the oldest is dropped
    pub max_pending: usize,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            broker_host: "localhost".to_string(),
            broker_port: 1883,
            client_id: "iot_default".to_string(),
            qos: 1,
            keepalive_sec: 60,
            topic_prefix: "home/sensors".to_string(),
            max_pending: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub base_url: String,
    pub port: u16,
    pub api_key: String,
    pub timeout_ms: u64,
    pub retry_count: u32,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost".to_string(),
            port: 8080,
            api_key: String::new(),
            timeout_ms: 5000,
            retry_count: 3,
        }
    }
}

impl Config {
    /// Load and validate configuration from a YAML file
    ///
    /// A missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            warn!("Config file {:?} not found, using defaults", path);
            return Ok(Self::default());
        }

        let config_dir = path.parent().unwrap_or_else(|| Path::new("."));
        let yaml = YamlLoader::new(config_dir).load_file(path)?;
        let config = Self::from_yaml(yaml)?;
        config.validate()?;

        info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Parse configuration from an already loaded YAML value
    pub fn from_yaml(yaml: Value) -> ConfigResult<Self> {
        if yaml.is_null() {
            return Ok(Self::default());
        }
        if !yaml.is_mapping() {
            return Err(ConfigError::InvalidValue {
                key: "root".to_string(),
                reason: "configuration must be a mapping".to_string(),
            });
        }

        serde_yaml::from_value(yaml).map_err(|e| ConfigError::InvalidValue {
            key: "root".to_string(),
            reason: e.to_string(),
        })
    }

    /// Reject settings the runtime cannot honour
    pub fn validate(&self) -> ConfigResult<()> {
        let pipeline = &self.pipeline;
        if pipeline.threshold_min > pipeline.threshold_max {
            return Err(ConfigError::ValidationFailed {
                message: format!(
                    "pipeline.threshold_min ({}) is greater than pipeline.threshold_max ({})",
                    pipeline.threshold_min, pipeline.threshold_max
                ),
            });
        }
        if pipeline.moving_average_window == 0 {
            return Err(ConfigError::ValidationFailed {
                message: "pipeline.moving_average_window must be at least 1".to_string(),
            });
        }
        if self.communication.mqtt.max_pending == 0 {
            return Err(ConfigError::ValidationFailed {
                message: "communication.mqtt.max_pending must be at least 1".to_string(),
            });
        }
        if self.system.cycle_interval_ms == 0 {
            return Err(ConfigError::ValidationFailed {
                message: "system.cycle_interval_ms must be positive".to_string(),
            });
        }
        Ok(())
    }
}
