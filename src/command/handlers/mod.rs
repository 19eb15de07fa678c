//! Device action handlers

mod appliance;
mod curtain;
mod sensor;

pub use appliance::handle_switch;
pub use curtain::handle_position;
pub use sensor::handle_read;

use crate::clock::Clock;
use crate::devices::DeviceBus;
use crate::events::EventSink;
use smarthome_shared::SensorReading;

/// Context passed to action handlers
pub struct HandlerContext<'a> {
    pub bus: &'a mut dyn DeviceBus,
    pub clock: &'a dyn Clock,
    pub sink: &'a dyn EventSink,
}

/// What a handler produced
#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome {
    /// Actuator moved; nothing to report back
    Done,
    /// Sensor sampled; success or failure is carried in the reading
    Reading(SensorReading),
}
