//! In-memory board used when no hardware is attached

use super::{Actuator, DeviceBus, Positional, Sensor, SensorError};
use smarthome_shared::policy::{CURTAIN_CLOSED_ANGLE, CURTAIN_OPEN_ANGLE};
use std::collections::HashMap;
use std::ops::RangeInclusive;
use tracing::debug;

/// Simulated relays, curtain servo and climate sensor
#[derive(Debug, Clone)]
pub struct SimulatedBoard {
    relays: HashMap<Actuator, bool>,
    curtain_angle: u8,
    temperature: Option<f32>,
    humidity: Option<f32>,
}

impl SimulatedBoard {
    /// Create a board with every relay off and the curtain closed.
    /// A `None` sensor value makes reads of that sensor fail.
    pub fn new(temperature: Option<f32>, humidity: Option<f32>) -> Self {
        Self {
            relays: Actuator::ALL.iter().map(|a| (*a, false)).collect(),
            curtain_angle: CURTAIN_CLOSED_ANGLE,
            temperature,
            humidity,
        }
    }

    /// Get the relay state of an appliance
    pub fn actuator(&self, id: Actuator) -> bool {
        self.relays.get(&id).copied().unwrap_or(false)
    }

    /// Get the curtain servo angle in degrees
    pub fn curtain_angle(&self) -> u8 {
        self.curtain_angle
    }
}

impl DeviceBus for SimulatedBoard {
    fn set_actuator(&mut self, id: Actuator, on: bool) {
        debug!("[BOARD] relay {} -> {}", id, on);
        self.relays.insert(id, on);
    }

    fn open_positional(&mut self, id: Positional) {
        debug!("[BOARD] {} servo -> {}°", id, CURTAIN_OPEN_ANGLE);
        self.curtain_angle = CURTAIN_OPEN_ANGLE;
    }

    fn close_positional(&mut self, id: Positional) {
        debug!("[BOARD] {} servo -> {}°", id, CURTAIN_CLOSED_ANGLE);
        self.curtain_angle = CURTAIN_CLOSED_ANGLE;
    }

    fn read_sensor(&mut self, id: Sensor) -> Result<f32, SensorError> {
        let value = match id {
            Sensor::Temperature => self.temperature,
            Sensor::Humidity => self.humidity,
        };
        match value {
            Some(v) if v.is_nan() => Err(SensorError::NoValue(id)),
            Some(v) if !sensor_range(id).contains(&v) => Err(SensorError::OutOfRange(id, v)),
            Some(v) => Ok(v),
            None => Err(SensorError::NoValue(id)),
        }
    }
}

/// Measurement range of a DHT22-class sensor
fn sensor_range(id: Sensor) -> RangeInclusive<f32> {
    match id {
        Sensor::Temperature => -40.0..=80.0,
        Sensor::Humidity => 0.0..=100.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let board = SimulatedBoard::new(Some(24.0), Some(60.0));
        for actuator in Actuator::ALL {
            assert!(!board.actuator(actuator));
        }
        assert_eq!(board.curtain_angle(), CURTAIN_CLOSED_ANGLE);
    }

    #[test]
    fn test_relays_and_curtain() {
        let mut board = SimulatedBoard::new(None, None);
        board.set_actuator(Actuator::Fan, true);
        assert!(board.actuator(Actuator::Fan));
        assert!(!board.actuator(Actuator::Light));

        board.open_positional(Positional::Curtain);
        assert_eq!(board.curtain_angle(), CURTAIN_OPEN_ANGLE);
        board.close_positional(Positional::Curtain);
        assert_eq!(board.curtain_angle(), CURTAIN_CLOSED_ANGLE);
    }

    #[test]
    fn test_sensor_reads() {
        let mut board = SimulatedBoard::new(Some(22.5), Some(f32::NAN));
        assert_eq!(board.read_sensor(Sensor::Temperature), Ok(22.5));
        assert_eq!(
            board.read_sensor(Sensor::Humidity),
            Err(SensorError::NoValue(Sensor::Humidity))
        );
    }

    #[test]
    fn test_out_of_range_read_fails() {
        let mut board = SimulatedBoard::new(Some(120.0), Some(40.0));
        assert_eq!(
            board.read_sensor(Sensor::Temperature),
            Err(SensorError::OutOfRange(Sensor::Temperature, 120.0))
        );
        assert_eq!(board.read_sensor(Sensor::Humidity), Ok(40.0));
    }
}
