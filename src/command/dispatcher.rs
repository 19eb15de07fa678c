//! Command dispatcher - binds command names to device actions and runs them

use super::handlers::{self, ActionOutcome, HandlerContext};
use super::table::{ActionTable, DeviceAction};
use crate::clock::Clock;
use crate::devices::DeviceBus;
use crate::events::{EventSink, NodeEvent};
use smarthome_shared::{Command, SensorReading};
use std::fmt;
use std::sync::Arc;

/// Why a command was not executed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    UnknownCommand(String),
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::UnknownCommand(name) => write!(f, "Unknown command: {}", name),
        }
    }
}

/// Result of dispatching one command
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchResult {
    /// Bound to an action and executed exactly once
    Accepted {
        command: Command,
        reading: Option<SensorReading>,
    },
    /// Nothing was executed
    Rejected(RejectReason),
}

impl DispatchResult {
    pub fn is_accepted(&self) -> bool {
        matches!(self, DispatchResult::Accepted { .. })
    }
}

/// Executes commands against the device bus
pub struct CommandDispatcher<B: DeviceBus> {
    table: ActionTable,
    bus: B,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn EventSink>,
}

impl<B: DeviceBus> CommandDispatcher<B> {
    pub fn new(table: ActionTable, bus: B, clock: Arc<dyn Clock>, sink: Arc<dyn EventSink>) -> Self {
        Self {
            table,
            bus,
            clock,
            sink,
        }
    }

    pub fn table(&self) -> &ActionTable {
        &self.table
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    /// Look up a command and run its action once
    pub async fn dispatch(&mut self, command: &Command) -> DispatchResult {
        let Some(action) = self.table.lookup(&command.name).copied() else {
            self.sink.emit(NodeEvent::CommandRejected {
                command: command.name.clone(),
            });
            return DispatchResult::Rejected(RejectReason::UnknownCommand(command.name.clone()));
        };

        self.sink.emit(NodeEvent::CommandAccepted {
            command: command.name.clone(),
        });

        let mut ctx = HandlerContext {
            bus: &mut self.bus,
            clock: self.clock.as_ref(),
            sink: self.sink.as_ref(),
        };

        let outcome = match action {
            DeviceAction::Switch { actuator, on } => handlers::handle_switch(&mut ctx, actuator, on),
            DeviceAction::Position { target, open } => {
                handlers::handle_position(&mut ctx, target, open).await
            }
            DeviceAction::Read(sensor) => handlers::handle_read(&mut ctx, sensor),
        };

        let reading = match outcome {
            ActionOutcome::Reading(reading) => Some(reading),
            ActionOutcome::Done => None,
        };

        DispatchResult::Accepted {
            command: command.clone(),
            reading,
        }
    }
}
