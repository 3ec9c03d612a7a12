//! YAML configuration loading for homecore
//!
//! Configuration lives in a single YAML file (`homecore.yaml` by default)
//! with support for two custom tags:
//!
//! - `!include path` - Include another YAML file
//! - `!env_var VAR [default]` - Environment variable substitution
//!
//! # Example
//!
//! ```ignore
//! use hc_config::{config_path, Config};
//!
//! let config = Config::load(config_path(std::env::args().nth(1)))?;
//! println!("fan triggers at {}", config.devices.fan.auto_trigger_temp);
//! ```

mod config;
mod error;
mod loader;

use std::path::PathBuf;

pub use config::{
    AlarmConfig, CommunicationConfig, Config, DevicesConfig, FanConfig, HttpConfig, MqttConfig,
    PipelineConfig, SensorConfig, SensorsConfig, SystemConfig, CONFIG_PATH_ENV,
    DEFAULT_CONFIG_FILE,
};
pub use error::{ConfigError, ConfigResult};
pub use loader::{load_yaml, load_yaml_string, YamlLoader};

// Re-export serde_yaml::Value for convenience
pub use serde_yaml::Value;

/// Pick the configuration file: explicit argument, then `HOMECORE_CONFIG`,
/// then `homecore.yaml` in the working directory
pub fn config_path(arg: Option<String>) -> PathBuf {
    arg.or_else(|| std::env::var(CONFIG_PATH_ENV).ok())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
}
