//! Appliance relay handler

use super::{ActionOutcome, HandlerContext};
use crate::devices::Actuator;
use crate::events::NodeEvent;

/// Switch one appliance relay. Idempotent: repeating a command re-applies the same level.
pub fn handle_switch(ctx: &mut HandlerContext<'_>, actuator: Actuator, on: bool) -> ActionOutcome {
    ctx.bus.set_actuator(actuator, on);
    ctx.sink.emit(NodeEvent::Switched { actuator, on });
    ActionOutcome::Done
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{drain, BusCall, ChannelSink, ManualClock, RecordingBus};

    #[test]
    fn test_switch_drives_bus_and_reports() {
        let mut bus = RecordingBus::new();
        let clock = ManualClock::new();
        let (sink, mut rx) = ChannelSink::new();
        let mut ctx = HandlerContext {
            bus: &mut bus,
            clock: &clock,
            sink: &sink,
        };

        assert_eq!(handle_switch(&mut ctx, Actuator::Fan, true), ActionOutcome::Done);
        assert_eq!(handle_switch(&mut ctx, Actuator::Fan, true), ActionOutcome::Done);

        assert!(bus.relay(Actuator::Fan));
        assert_eq!(
            bus.calls,
            vec![BusCall::Set(Actuator::Fan, true), BusCall::Set(Actuator::Fan, true)]
        );
        assert_eq!(
            drain(&mut rx)[0],
            NodeEvent::Switched {
                actuator: Actuator::Fan,
                on: true
            }
        );
        assert!(clock.sleeps().is_empty());
    }
}
