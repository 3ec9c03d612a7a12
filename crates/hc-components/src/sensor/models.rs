//! Random-walk models for the bundled sensor kinds

use hc_core::SensorCategory;
use rand::rngs::StdRng;
use rand::Rng;

use super::SensorModel;

/// DHT22-style temperature probe
#[derive(Debug, Clone)]
pub struct TemperatureModel {
    pub min: f64,
    pub max: f64,
    last: f64,
}

impl TemperatureModel {
    /// Gain applied to the user calibration offset
    pub const CALIBRATION_GAIN: f64 = 0.95;
    pub const MAX_DRIFT: f64 = 0.5;

    pub fn new(min: f64, max: f64) -> Self {
        Self {
            min,
            max,
            last: 22.0,
        }
    }
}

impl Default for TemperatureModel {
    fn default() -> Self {
        Self::new(-40.0, 85.0)
    }
}

impl SensorModel for TemperatureModel {
    fn category(&self) -> SensorCategory {
        SensorCategory::Temperature
    }

    fn unit(&self) -> &'static str {
        "°C"
    }

    fn raw_value(&mut self, rng: &mut StdRng) -> f64 {
        self.last += rng.gen_range(-Self::MAX_DRIFT..=Self::MAX_DRIFT);
        if self.last < self.min {
            self.last = self.min + 1.0;
        }
        if self.last > self.max {
            self.last = self.max - 1.0;
        }
        self.last
    }

    fn calibrate(&self, raw: f64, offset: f64) -> f64 {
        raw + offset * Self::CALIBRATION_GAIN
    }

    fn is_valid(&self, value: f64) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

/// DHT22-style relative humidity probe
#[derive(Debug, Clone)]
pub struct HumidityModel {
    pub min: f64,
    pub max: f64,
    last: f64,
}

impl HumidityModel {
    pub const MAX_DRIFT: f64 = 1.0;

    pub fn new(min: f64, max: f64) -> Self {
        Self {
            min,
            max,
            last: 55.0,
        }
    }
}

impl Default for HumidityModel {
    fn default() -> Self {
        Self::new(0.0, 100.0)
    }
}

impl SensorModel for HumidityModel {
    fn category(&self) -> SensorCategory {
        SensorCategory::Humidity
    }

    fn unit(&self) -> &'static str {
        "%RH"
    }

    fn raw_value(&mut self, rng: &mut StdRng) -> f64 {
        self.last += rng.gen_range(-Self::MAX_DRIFT..=Self::MAX_DRIFT);
        if self.last < self.min {
            self.last = self.min + 2.0;
        }
        if self.last > self.max {
            self.last = self.max - 2.0;
        }
        self.last
    }

    fn is_valid(&self, value: f64) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

/// PIR motion detector reporting 0.0 or 1.0
#[derive(Debug, Clone)]
pub struct MotionModel {
    /// Probability threshold: motion is reported when a uniform draw exceeds it
    pub sensitivity: f64,
}

impl MotionModel {
    pub fn new(sensitivity: f64) -> Self {
        Self { sensitivity }
    }
}

impl Default for MotionModel {
    fn default() -> Self {
        Self::new(0.8)
    }
}

impl SensorModel for MotionModel {
    fn category(&self) -> SensorCategory {
        SensorCategory::Motion
    }

    fn unit(&self) -> &'static str {
        "bool"
    }

    fn raw_value(&mut self, rng: &mut StdRng) -> f64 {
        if rng.gen::<f64>() > self.sensitivity {
            1.0
        } else {
            0.0
        }
    }

    fn is_valid(&self, value: f64) -> bool {
        value == 0.0 || value == 1.0
    }
}
