//! Sensor construction by kind name

use hc_config::{SensorConfig, SensorsConfig};
use hc_core::SensorCategory;
use std::collections::HashMap;
use tracing::{debug, info};

use super::{HumidityModel, MotionModel, Sensor, SimulatedSensor, TemperatureModel};
use crate::error::{ComponentError, ComponentResult};

/// Builds a sensor from a name and pin
pub type SensorCreator = Box<dyn Fn(&str, u32) -> Box<dyn Sensor> + Send + Sync>;

/// Creates the bundled sensor kinds plus any registered custom kinds
#[derive(Default)]
pub struct SensorFactory {
    creators: HashMap<String, SensorCreator>,
}

impl SensorFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a custom sensor kind
    ///
    /// Built-in kinds (`temperature`, `humidity`, `motion`) take precedence.
    pub fn register<F>(&mut self, kind: impl Into<String>, creator: F)
    where
        F: Fn(&str, u32) -> Box<dyn Sensor> + Send + Sync + 'static,
    {
        let kind = kind.into();
        info!("Registered custom sensor kind: {}", kind);
        self.creators.insert(kind, Box::new(creator));
    }

    pub fn is_registered(&self, kind: &str) -> bool {
        kind.parse::<SensorCategory>().is_ok() || self.creators.contains_key(kind)
    }

    /// Create a simulator for a built-in category
    pub fn create_builtin(category: SensorCategory, name: &str, pin: u32) -> Box<dyn Sensor> {
        match category {
            SensorCategory::Temperature => {
                Box::new(SimulatedSensor::new(name, pin, TemperatureModel::default()))
            }
            SensorCategory::Humidity => {
                Box::new(SimulatedSensor::new(name, pin, HumidityModel::default()))
            }
            SensorCategory::Motion => {
                Box::new(SimulatedSensor::new(name, pin, MotionModel::default()))
            }
        }
    }

    /// Create a sensor by kind name
    pub fn create(&self, kind: &str, name: &str, pin: u32) -> ComponentResult<Box<dyn Sensor>> {
        if let Ok(category) = kind.parse::<SensorCategory>() {
            return Ok(Self::create_builtin(category, name, pin));
        }

        match self.creators.get(kind) {
            Some(creator) => {
                info!("Creating custom sensor kind: {}", kind);
                Ok(creator(name, pin))
            }
            None => Err(ComponentError::UnknownSensorKind(kind.to_string())),
        }
    }

    /// Create the enabled sensors of the `sensors:` section
    pub fn from_config(&self, config: &SensorsConfig) -> Vec<Box<dyn Sensor>> {
        let entries: [(&str, &str, &SensorConfig); 3] = [
            ("temperature", "DHT22_Temp", &config.temperature),
            ("humidity", "DHT22_Hum", &config.humidity),
            ("motion", "PIR_Motion", &config.motion),
        ];

        let mut sensors = Vec::new();
        for (kind, name, settings) in entries {
            if !settings.enabled {
                debug!("Sensor {} disabled", name);
                continue;
            }
            if let Ok(mut sensor) = self.create(kind, name, settings.pin) {
                if settings.calibration_offset != 0.0 {
                    sensor.calibrate(settings.calibration_offset);
                }
                sensors.push(sensor);
            }
        }
        sensors
    }
}
