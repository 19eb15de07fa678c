//! Node events and the sinks that observe them
//!
//! Core components report what happened through an [`EventSink`] instead of
//! logging inline; the sink is owned by whoever assembles the node.

use smarthome_shared::{Actuator, Positional, Sensor, UpdateFailure, UpdateKind};
use std::net::IpAddr;
use tracing::{error, info, warn};

/// Events emitted by the supervisor, dispatcher and update manager
#[derive(Debug, Clone, PartialEq)]
pub enum NodeEvent {
    /// Association started
    Connecting { link: &'static str, max_attempts: u32 },
    /// Association restarted after a loss or an exhausted attempt
    Reconnecting { link: &'static str, max_attempts: u32 },
    /// Link is up
    Connected { address: Option<IpAddr> },
    /// Link dropped while believed connected
    LinkLost,
    /// Attempt budget exhausted without a link-up
    ConnectFailed { attempts: u32 },

    /// Command bound to an action and executed
    CommandAccepted { command: String },
    /// Command name not in the action table
    CommandRejected { command: String },

    /// Appliance relay switched
    Switched { actuator: Actuator, on: bool },
    /// Servo moved and settled
    Positioned { target: Positional, open: bool },
    /// Sensor read succeeded
    SensorRead { sensor: Sensor, value: f32 },
    /// Sensor read failed
    SensorFault { sensor: Sensor, reason: String },

    UpdateStarted { kind: UpdateKind },
    /// A decile boundary was crossed
    UpdateProgress { percent: u8 },
    UpdateCompleted { kind: UpdateKind },
    UpdateFailed { reason: UpdateFailure },
    /// Start arrived while another session was running
    UpdateOverlap { active: UpdateKind },
}

/// Observer for node events
pub trait EventSink: Send + Sync {
    fn emit(&self, event: NodeEvent);
}

/// Renders events as log lines
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: NodeEvent) {
        match event {
            NodeEvent::Connecting { link, max_attempts } => {
                info!("Connecting via {} (max {} attempts)", link, max_attempts);
            }
            NodeEvent::Reconnecting { link, max_attempts } => {
                warn!("Reconnecting via {} (max {} attempts)", link, max_attempts);
            }
            NodeEvent::Connected { address } => match address {
                Some(addr) => info!("Network connected, node address {}", addr),
                None => info!("Network connected"),
            },
            NodeEvent::LinkLost => {
                warn!("Network connection lost");
            }
            NodeEvent::ConnectFailed { attempts } => {
                error!("Network connection failed after {} attempts", attempts);
            }
            NodeEvent::CommandAccepted { command } => {
                info!("Command accepted: {}", command);
            }
            NodeEvent::CommandRejected { command } => {
                warn!("Unknown command rejected: {:?}", command);
            }
            NodeEvent::Switched { actuator, on } => {
                info!("{} {}", actuator, if on { "on" } else { "off" });
            }
            NodeEvent::Positioned { target, open } => {
                info!("{} {}", target, if open { "opened" } else { "closed" });
            }
            NodeEvent::SensorRead { sensor, value } => {
                info!("{}: {:.1}{}", sensor, value, sensor.unit());
            }
            NodeEvent::SensorFault { sensor, reason } => {
                error!("{} read failed: {}", sensor, reason);
            }
            NodeEvent::UpdateStarted { kind } => {
                info!("Start updating {}", kind);
            }
            NodeEvent::UpdateProgress { percent } => {
                info!("Update progress: {}%", percent);
            }
            NodeEvent::UpdateCompleted { kind } => {
                info!("Update completed ({})", kind);
            }
            NodeEvent::UpdateFailed { reason } => {
                error!("Update failed: {}", reason);
            }
            NodeEvent::UpdateOverlap { active } => {
                error!("Update start ignored, {} session already running", active);
            }
        }
    }
}
