//! Sensors
//!
//! [`Sensor`] is the interface the sensor service drives. The bundled
//! simulators are [`SimulatedSensor`]s parameterised by a [`SensorModel`]
//! that supplies the category specific steps of a read.

mod factory;
mod models;

pub use factory::{SensorCreator, SensorFactory};
pub use models::{HumidityModel, MotionModel, TemperatureModel};

use hc_core::{Reading, SensorCategory};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, error, info, warn};

/// A source of readings
pub trait Sensor: Send {
    fn name(&self) -> &str;

    fn category(&self) -> SensorCategory;

    fn pin(&self) -> u32;

    /// Prepare the sensor; returns false if it cannot be used
    fn initialize(&mut self) -> bool;

    fn is_initialized(&self) -> bool;

    /// Take one reading
    fn read(&mut self) -> Reading;

    /// Set the user calibration offset
    fn calibrate(&mut self, offset: f64);

    fn shutdown(&mut self);
}

/// Category specific behaviour of a simulated sensor
pub trait SensorModel: Send {
    fn category(&self) -> SensorCategory;

    fn unit(&self) -> &'static str;

    /// Produce the next raw value
    fn raw_value(&mut self, rng: &mut StdRng) -> f64;

    /// Apply the calibration offset to a raw value
    fn calibrate(&self, raw: f64, offset: f64) -> f64 {
        raw + offset
    }

    fn is_valid(&self, _value: f64) -> bool {
        true
    }
}

/// Sensor driven by a random model instead of hardware
pub struct SimulatedSensor<M> {
    name: String,
    pin: u32,
    model: M,
    initialized: bool,
    calibration_offset: f64,
    rng: StdRng,
}

impl<M: SensorModel> SimulatedSensor<M> {
    pub fn new(name: impl Into<String>, pin: u32, model: M) -> Self {
        Self::with_rng(name, pin, model, StdRng::from_entropy())
    }

    /// Create a sensor with a reproducible random sequence
    pub fn seeded(name: impl Into<String>, pin: u32, model: M, seed: u64) -> Self {
        Self::with_rng(name, pin, model, StdRng::seed_from_u64(seed))
    }

    fn with_rng(name: impl Into<String>, pin: u32, model: M, rng: StdRng) -> Self {
        let name = name.into();
        debug!("Sensor created: {} on pin {}", name, pin);
        Self {
            name,
            pin,
            model,
            initialized: false,
            calibration_offset: 0.0,
            rng,
        }
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn calibration_offset(&self) -> f64 {
        self.calibration_offset
    }
}

impl<M: SensorModel> Sensor for SimulatedSensor<M> {
    fn name(&self) -> &str {
        &self.name
    }

    fn category(&self) -> SensorCategory {
        self.model.category()
    }

    fn pin(&self) -> u32 {
        self.pin
    }

    fn initialize(&mut self) -> bool {
        if self.initialized {
            warn!("{} already initialized", self.name);
            return true;
        }
        self.initialized = true;
        info!("{} initialized ({})", self.name, self.model.unit());
        true
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn read(&mut self) -> Reading {
        let category = self.model.category();
        if !self.initialized {
            error!("Attempt to read uninitialized sensor: {}", self.name);
            return Reading::new(self.name.clone(), category, 0.0).invalidated();
        }

        let raw = self.model.raw_value(&mut self.rng);
        let mut reading = Reading::new(self.name.clone(), category, raw);
        reading.processed_value = self.model.calibrate(raw, self.calibration_offset);
        reading.valid = self.model.is_valid(reading.processed_value);
        reading.with_unit(self.model.unit())
    }

    fn calibrate(&mut self, offset: f64) {
        self.calibration_offset = offset;
        info!("{} calibrated with offset {}", self.name, offset);
    }

    fn shutdown(&mut self) {
        if !self.initialized {
            return;
        }
        info!("Shutting down sensor: {}", self.name);
        self.initialized = false;
    }
}
