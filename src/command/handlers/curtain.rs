//! Curtain servo handler

use super::{ActionOutcome, HandlerContext};
use crate::devices::Positional;
use crate::events::NodeEvent;
use smarthome_shared::policy::CURTAIN_SETTLE_MS;
use std::time::Duration;

/// Move the servo and hold the caller until it has settled.
///
/// The settle time blocks the control loop; commands queued behind this one
/// wait for it.
pub async fn handle_position(
    ctx: &mut HandlerContext<'_>,
    target: Positional,
    open: bool,
) -> ActionOutcome {
    if open {
        ctx.bus.open_positional(target);
    } else {
        ctx.bus.close_positional(target);
    }

    ctx.clock.sleep(Duration::from_millis(CURTAIN_SETTLE_MS)).await;

    ctx.sink.emit(NodeEvent::Positioned { target, open });
    ActionOutcome::Done
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{drain, BusCall, ChannelSink, ManualClock, RecordingBus};

    #[tokio::test]
    async fn test_open_then_close_waits_to_settle() {
        let mut bus = RecordingBus::new();
        let clock = ManualClock::new();
        let (sink, mut rx) = ChannelSink::new();
        let mut ctx = HandlerContext {
            bus: &mut bus,
            clock: &clock,
            sink: &sink,
        };

        handle_position(&mut ctx, Positional::Curtain, true).await;
        handle_position(&mut ctx, Positional::Curtain, false).await;

        assert_eq!(
            bus.calls,
            vec![
                BusCall::Open(Positional::Curtain),
                BusCall::Close(Positional::Curtain)
            ]
        );
        assert_eq!(
            clock.sleeps(),
            vec![Duration::from_millis(1000), Duration::from_millis(1000)]
        );

        let events = drain(&mut rx);
        assert_eq!(events.len(), 2);
        assert_eq!(
            events[1],
            NodeEvent::Positioned {
                target: Positional::Curtain,
                open: false
            }
        );
    }
}
