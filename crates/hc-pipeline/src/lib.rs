//! Reading processing pipeline
//!
//! A [`Pipeline`] is an ordered list of [`Stage`]s. Each reading passes
//! through the stages in order; once a stage marks it invalid the remaining
//! stages are skipped and the reading is returned as is.

mod filter;
mod transformer;
mod validator;

pub use filter::{
    Filter, FilterFn, FilterStrategy, UnknownStrategy, EMA_ALPHA, THRESHOLD_MAX_DELTA,
};
pub use transformer::{TransformFn, Transformer};
pub use validator::Validator;

use hc_config::PipelineConfig;
use hc_core::{Reading, SensorCategory};
use tracing::{debug, instrument, warn};

/// One processing step
#[derive(Debug, Clone)]
pub enum Stage {
    Validator(Validator),
    Filter(Filter),
    Transformer(Transformer),
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Validator(_) => "DataValidator",
            Stage::Filter(_) => "DataFilter",
            Stage::Transformer(_) => "DataTransformer",
        }
    }

    fn handle(&mut self, reading: Reading) -> Reading {
        match self {
            Stage::Validator(v) => v.handle(reading),
            Stage::Filter(f) => f.handle(reading),
            Stage::Transformer(t) => t.handle(reading),
        }
    }
}

impl From<Validator> for Stage {
    fn from(v: Validator) -> Self {
        Stage::Validator(v)
    }
}

impl From<Filter> for Stage {
    fn from(f: Filter) -> Self {
        Stage::Filter(f)
    }
}

impl From<Transformer> for Stage {
    fn from(t: Transformer) -> Self {
        Stage::Transformer(t)
    }
}

/// Ordered chain of stages
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    stages: Vec<Stage>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the standard Validator → Filter → Transformer chain
    ///
    /// An unknown strategy name falls back to the moving average.
    pub fn from_config(config: &PipelineConfig) -> Self {
        let strategy = config.filter_strategy.parse().unwrap_or_else(|e| {
            warn!("{}, using moving_average", e);
            FilterStrategy::MovingAverage
        });

        let mut pipeline = Self::new();
        pipeline
            .add_handler(Validator::new(config.threshold_min, config.threshold_max))
            .add_handler(Filter::new(strategy, config.moving_average_window))
            .add_handler(Transformer::new().with_transform(SensorCategory::Humidity, |v| v));

        debug!(
            "Pipeline built: {} (strategy {})",
            pipeline.handler_names().join(" -> "),
            config.filter_strategy
        );
        pipeline
    }

    /// Append a stage
    pub fn add_handler(&mut self, stage: impl Into<Stage>) -> &mut Self {
        self.stages.push(stage.into());
        self
    }

    /// Run a reading through every stage
    #[instrument(level = "trace", skip(self, reading), fields(sensor = %reading.source_name))]
    pub fn process(&mut self, reading: Reading) -> Reading {
        if self.stages.is_empty() {
            warn!("Pipeline has no handlers, reading passed through");
            return reading;
        }

        let mut reading = reading;
        for stage in &mut self.stages {
            reading = stage.handle(reading);
            if !reading.valid {
                break;
            }
        }
        reading
    }

    pub fn handler_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(Stage::name).collect()
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn stages_mut(&mut self) -> &mut [Stage] {
        &mut self.stages
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}
