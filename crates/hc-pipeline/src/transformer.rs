//! Per-category value transformation

use hc_core::{Reading, SensorCategory};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Transformation applied to a processed value
pub type TransformFn = Arc<dyn Fn(f64) -> f64 + Send + Sync>;

/// Applies a registered function to readings of matching category
///
/// Categories without a registered function pass through unchanged.
#[derive(Clone, Default)]
pub struct Transformer {
    transforms: HashMap<SensorCategory, TransformFn>,
}

impl Transformer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the transform for a category
    pub fn with_transform<F>(mut self, category: SensorCategory, f: F) -> Self
    where
        F: Fn(f64) -> f64 + Send + Sync + 'static,
    {
        self.transforms.insert(category, Arc::new(f));
        self
    }

    pub fn has_transform(&self, category: SensorCategory) -> bool {
        self.transforms.contains_key(&category)
    }

    pub fn handle(&self, mut reading: Reading) -> Reading {
        if !reading.valid {
            return reading;
        }
        if let Some(transform) = self.transforms.get(&reading.category) {
            reading.processed_value = transform(reading.processed_value);
        }
        reading
    }
}

impl fmt::Debug for Transformer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transformer")
            .field("categories", &self.transforms.keys().collect::<Vec<_>>())
            .finish()
    }
}
