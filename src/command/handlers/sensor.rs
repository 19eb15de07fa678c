//! Sensor read handler

use super::{ActionOutcome, HandlerContext};
use crate::devices::Sensor;
use crate::events::NodeEvent;
use smarthome_shared::SensorReading;

/// Sample a sensor. A failed read is still an accepted command; the failure
/// travels in the reading.
pub fn handle_read(ctx: &mut HandlerContext<'_>, sensor: Sensor) -> ActionOutcome {
    let value = ctx.bus.read_sensor(sensor);

    match &value {
        Ok(value) => ctx.sink.emit(NodeEvent::SensorRead {
            sensor,
            value: *value,
        }),
        Err(e) => ctx.sink.emit(NodeEvent::SensorFault {
            sensor,
            reason: e.to_string(),
        }),
    }

    ActionOutcome::Reading(SensorReading { sensor, value })
}
