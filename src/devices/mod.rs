//! Actuator and sensor boundary
//!
//! Command handlers drive hardware only through [`DeviceBus`].

mod simulated;

pub use simulated::SimulatedBoard;
pub use smarthome_shared::{Actuator, Positional, Sensor, SensorError};

/// Capability interface for the node's actuators and sensors
pub trait DeviceBus: Send {
    /// Switch an appliance relay
    fn set_actuator(&mut self, id: Actuator, on: bool);

    /// Drive a positional actuator to its open position
    fn open_positional(&mut self, id: Positional);

    /// Drive a positional actuator to its closed position
    fn close_positional(&mut self, id: Positional);

    /// Sample a sensor
    fn read_sensor(&mut self, id: Sensor) -> Result<f32, SensorError>;
}
