//! Noise filtering over a trailing window of raw values

use hc_core::Reading;
use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use tracing::trace;

/// Smoothing factor of the exponential moving average
pub const EMA_ALPHA: f64 = 0.3;

/// Largest jump between consecutive values the threshold strategy accepts
pub const THRESHOLD_MAX_DELTA: f64 = 5.0;

/// User supplied filter function
///
/// Receives the new value and the window as it was before this reading.
pub type FilterFn = Arc<dyn Fn(f64, &VecDeque<f64>) -> f64 + Send + Sync>;

/// Error returned for an unrecognised strategy name
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown filter strategy: {0}")]
pub struct UnknownStrategy(pub String);

/// How a [`Filter`] derives its output from the new value and the window
#[derive(Clone, Default)]
pub enum FilterStrategy {
    /// Pass values through unchanged
    None,
    /// Mean of the new value and the `window_size - 1` values before it
    ///
    /// The new value counts toward the window, so with `window_size` 3 the
    /// inputs 10, 12, 14, 16 give 10, 11, 12, 14. Until the window fills,
    /// the mean covers every value seen so far.
    #[default]
    MovingAverage,
    /// `α·new + (1-α)·last` with α = [`EMA_ALPHA`]
    ExponentialMovingAverage,
    /// Reject spikes larger than [`THRESHOLD_MAX_DELTA`] by repeating the last value
    Threshold,
    Custom(FilterFn),
}

impl FilterStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            FilterStrategy::None => "none",
            FilterStrategy::MovingAverage => "moving_average",
            FilterStrategy::ExponentialMovingAverage => "exponential",
            FilterStrategy::Threshold => "threshold",
            FilterStrategy::Custom(_) => "custom",
        }
    }
}

impl fmt::Debug for FilterStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FilterStrategy {
    type Err = UnknownStrategy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(FilterStrategy::None),
            "moving_average" => Ok(FilterStrategy::MovingAverage),
            "exponential" => Ok(FilterStrategy::ExponentialMovingAverage),
            "threshold" => Ok(FilterStrategy::Threshold),
            _ => Err(UnknownStrategy(s.to_string())),
        }
    }
}

/// Filter stage
///
/// Keeps at most `window_size` prior raw values, oldest dropped first.
#[derive(Debug, Clone)]
pub struct Filter {
    strategy: FilterStrategy,
    window_size: usize,
    window: VecDeque<f64>,
}

impl Filter {
    /// Create a filter; a zero window size is raised to 1
    pub fn new(strategy: FilterStrategy, window_size: usize) -> Self {
        let window_size = window_size.max(1);
        Self {
            strategy,
            window_size,
            window: VecDeque::with_capacity(window_size),
        }
    }

    pub fn strategy(&self) -> &FilterStrategy {
        &self.strategy
    }

    pub fn set_strategy(&mut self, strategy: FilterStrategy) {
        self.strategy = strategy;
    }

    /// Replace the strategy with a custom function
    pub fn set_custom_strategy<F>(&mut self, f: F)
    where
        F: Fn(f64, &VecDeque<f64>) -> f64 + Send + Sync + 'static,
    {
        self.strategy = FilterStrategy::Custom(Arc::new(f));
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Change the window size, trimming the window immediately
    pub fn set_window_size(&mut self, window_size: usize) {
        self.window_size = window_size.max(1);
        self.trim();
    }

    /// Values currently retained, oldest first
    pub fn window(&self) -> &VecDeque<f64> {
        &self.window
    }

    /// Filter a reading
    ///
    /// Invalid readings are forwarded untouched and do not enter the window.
    pub fn handle(&mut self, mut reading: Reading) -> Reading {
        if !reading.valid {
            return reading;
        }

        let value = reading.processed_value;
        let filtered = self.apply(value);
        trace!(
            sensor = %reading.source_name,
            strategy = self.strategy.name(),
            value,
            filtered,
            "Filtered reading"
        );

        self.window.push_back(value);
        self.trim();

        reading.processed_value = filtered;
        reading
    }

    fn apply(&self, value: f64) -> f64 {
        match &self.strategy {
            FilterStrategy::None => value,
            FilterStrategy::MovingAverage => {
                let prior = self.window.iter().rev().take(self.window_size - 1);
                let (sum, count) = prior.fold((value, 1usize), |(sum, n), v| (sum + v, n + 1));
                sum / count as f64
            }
            FilterStrategy::ExponentialMovingAverage => match self.window.back() {
                Some(previous) => EMA_ALPHA * value + (1.0 - EMA_ALPHA) * previous,
                None => value,
            },
            FilterStrategy::Threshold => match self.window.back() {
                Some(&previous) if (value - previous).abs() > THRESHOLD_MAX_DELTA => previous,
                _ => value,
            },
            FilterStrategy::Custom(f) => f(value, &self.window),
        }
    }

    fn trim(&mut self) {
        while self.window.len() > self.window_size {
            self.window.pop_front();
        }
    }
}
