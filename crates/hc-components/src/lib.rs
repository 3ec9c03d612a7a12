//! Simulated hardware and transports for homecore
//!
//! - [`sensor`]: temperature, humidity and motion simulators behind the
//!   [`Sensor`] trait, plus a [`SensorFactory`] with custom kinds
//! - [`protocol`]: MQTT and HTTP clients behind the [`Protocol`] trait, the
//!   [`ProtocolAdapter`] envelope and the [`ProtocolFactory`]

pub mod protocol;
pub mod sensor;

mod error;

pub use error::{ComponentError, ComponentResult};
pub use protocol::{
    HttpClient, MessageCallback, MqttClient, Protocol, ProtocolAdapter, ProtocolFactory,
};
pub use sensor::{
    HumidityModel, MotionModel, Sensor, SensorCreator, SensorFactory, SensorModel,
    SimulatedSensor, TemperatureModel,
};
