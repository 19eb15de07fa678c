//! Device identifiers and sensor readings
//!
//! The node drives four relay-switched appliances, one servo curtain and a
//! combined temperature/humidity sensor.

use thiserror::Error;

use crate::policy::SENSOR_ERROR_SENTINEL;
use crate::ReadingReply;

/// Relay-switched appliances
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Actuator {
    Light,
    Fan,
    Tv,
    AirConditioner,
}

impl Actuator {
    pub const ALL: [Actuator; 4] = [
        Actuator::Light,
        Actuator::Fan,
        Actuator::Tv,
        Actuator::AirConditioner,
    ];
}

impl std::fmt::Display for Actuator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Actuator::Light => write!(f, "light"),
            Actuator::Fan => write!(f, "fan"),
            Actuator::Tv => write!(f, "tv"),
            Actuator::AirConditioner => write!(f, "air-conditioner"),
        }
    }
}

/// Servo-positioned actuators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Positional {
    Curtain,
}

impl std::fmt::Display for Positional {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Positional::Curtain => write!(f, "curtain"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sensor {
    Temperature,
    Humidity,
}

impl Sensor {
    /// Unit suffix used when logging a value
    pub fn unit(&self) -> &'static str {
        match self {
            Sensor::Temperature => "°C",
            Sensor::Humidity => "%",
        }
    }
}

impl std::fmt::Display for Sensor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Sensor::Temperature => write!(f, "temperature"),
            Sensor::Humidity => write!(f, "humidity"),
        }
    }
}

/// Errors from a sensor read
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SensorError {
    #[error("{0} read returned no value")]
    NoValue(Sensor),

    #[error("{0} read out of range: {1}")]
    OutOfRange(Sensor, f32),
}

/// Result of one sensor read
#[derive(Debug, Clone, PartialEq)]
pub struct SensorReading {
    pub sensor: Sensor,
    pub value: Result<f32, SensorError>,
}

impl SensorReading {
    /// Render for the wire, substituting the sentinel for a failed read
    pub fn to_reply(&self) -> ReadingReply {
        match &self.value {
            Ok(value) => ReadingReply {
                sensor: self.sensor.to_string(),
                value: *value,
                error: None,
            },
            Err(e) => ReadingReply {
                sensor: self.sensor.to_string(),
                value: SENSOR_ERROR_SENTINEL,
                error: Some(e.to_string()),
            },
        }
    }
}
