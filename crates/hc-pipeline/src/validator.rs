//! Range validation

use hc_core::Reading;
use tracing::debug;

/// Marks readings outside `[min, max]` as invalid
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Validator {
    min: f64,
    max: f64,
}

impl Validator {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn bounds(&self) -> (f64, f64) {
        (self.min, self.max)
    }

    /// Validate a reading; bounds are inclusive
    pub fn handle(&self, mut reading: Reading) -> Reading {
        if !reading.valid {
            return reading;
        }

        let value = reading.processed_value;
        reading.valid = (self.min..=self.max).contains(&value);
        if !reading.valid {
            debug!(
                sensor = %reading.source_name,
                value,
                min = self.min,
                max = self.max,
                "Reading out of range"
            );
        }
        reading
    }
}
