//! Sensor producer loop
//!
//! Each cycle reads every sensor, runs the reading through that sensor's own
//! pipeline and publishes valid results as [`SensorEvent`]s. Bus delivery is
//! synchronous, so rule evaluation and device commands complete inside the
//! cycle that produced the reading.

use hc_components::Sensor;
use hc_config::{PipelineConfig, SystemConfig};
use hc_core::events::SensorEvent;
use hc_event_bus::EventBus;
use hc_pipeline::Pipeline;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, instrument};

struct SensorChannel {
    sensor: Box<dyn Sensor>,
    pipeline: Pipeline,
}

/// Drives sensors on a fixed interval
pub struct SensorService {
    bus: Arc<EventBus>,
    channels: Vec<SensorChannel>,
    interval: Duration,
    /// 0 runs until shutdown
    max_cycles: u64,
    cycles: u64,
}

impl SensorService {
    pub fn new(bus: Arc<EventBus>, interval: Duration, max_cycles: u64) -> Self {
        Self {
            bus,
            channels: Vec::new(),
            interval,
            max_cycles,
            cycles: 0,
        }
    }

    pub fn from_config(bus: Arc<EventBus>, system: &SystemConfig) -> Self {
        Self::new(
            bus,
            Duration::from_millis(system.cycle_interval_ms),
            system.max_sensor_cycles,
        )
    }

    /// Add a sensor with its own pipeline
    pub fn add_sensor(&mut self, sensor: Box<dyn Sensor>, pipeline: Pipeline) {
        debug!(
            "Sensor {} attached to pipeline {:?}",
            sensor.name(),
            pipeline.handler_names()
        );
        self.channels.push(SensorChannel { sensor, pipeline });
    }

    /// Add sensors that each get a pipeline built from `config`
    pub fn add_sensors(&mut self, sensors: Vec<Box<dyn Sensor>>, config: &PipelineConfig) {
        for sensor in sensors {
            self.add_sensor(sensor, Pipeline::from_config(config));
        }
    }

    /// Initialize every sensor and drop the ones that fail
    ///
    /// Returns the number of sensors left.
    pub fn initialize(&mut self) -> usize {
        self.channels.retain_mut(|channel| {
            let ok = channel.sensor.initialize();
            if !ok {
                error!("Failed to initialize sensor {}", channel.sensor.name());
            }
            ok
        });
        info!("{} sensors ready", self.channels.len());
        self.channels.len()
    }

    pub fn sensor_count(&self) -> usize {
        self.channels.len()
    }

    pub fn sensor_names(&self) -> Vec<&str> {
        self.channels.iter().map(|c| c.sensor.name()).collect()
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Read every sensor once; returns the number of readings published
    #[instrument(level = "debug", skip(self), fields(cycle = self.cycles + 1))]
    pub fn run_cycle(&mut self) -> usize {
        self.cycles += 1;
        let mut published = 0;

        for channel in &mut self.channels {
            let reading = channel.pipeline.process(channel.sensor.read());
            if !reading.valid {
                debug!("Discarding invalid reading from {}", reading.source_name);
                continue;
            }

            debug!(
                "{} = {:.2} {}",
                reading.source_name,
                reading.processed_value,
                reading.unit.as_deref().unwrap_or("")
            );
            self.bus.publish_typed(SensorEvent::from_reading(&reading));
            published += 1;
        }

        published
    }

    fn finished(&self) -> bool {
        self.max_cycles > 0 && self.cycles >= self.max_cycles
    }

    /// Run cycles until the cycle limit or a shutdown signal
    ///
    /// The signal is checked between cycles only. Returns the service so the
    /// caller can shut the sensors down.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> Self {
        info!(
            "Sensor loop started (interval {:?}, max cycles {})",
            self.interval, self.max_cycles
        );
        let mut ticker = tokio::time::interval(self.interval);

        while !self.finished() {
            tokio::select! {
                _ = ticker.tick() => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                    continue;
                }
            }
            if *shutdown.borrow() {
                break;
            }
            self.run_cycle();
        }

        info!("Sensor loop stopped after {} cycles", self.cycles);
        self
    }

    pub fn shutdown(&mut self) {
        for channel in &mut self.channels {
            channel.sensor.shutdown();
        }
    }
}
