//! Host control loop
//!
//! The only place core state is mutated. Each iteration services pending
//! update callbacks, checks link health, then answers queued commands.

use crate::command::{CommandDispatcher, DispatchResult};
use crate::connectivity::ConnectivitySupervisor;
use crate::devices::DeviceBus;
use crate::link::NetworkLink;
use crate::update::{UpdateEvent, UpdateLifecycleManager};
use smarthome_shared::Command;
use std::time::Duration;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::{mpsc, oneshot};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

/// A command waiting for the loop, with the channel its result goes back on
#[derive(Debug)]
pub struct PendingCommand {
    pub command: Command,
    pub reply: oneshot::Sender<DispatchResult>,
}

/// What one loop iteration did
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ServiceReport {
    pub updates: usize,
    pub commands: usize,
    /// Whether any inbound channel is still open
    pub open: bool,
}

pub struct Controller<L: NetworkLink, B: DeviceBus> {
    supervisor: ConnectivitySupervisor<L>,
    dispatcher: CommandDispatcher<B>,
    updates: UpdateLifecycleManager,
    update_rx: mpsc::Receiver<UpdateEvent>,
    command_rx: mpsc::Receiver<PendingCommand>,
    loop_interval: Duration,
    updates_open: bool,
    commands_open: bool,
}

impl<L: NetworkLink, B: DeviceBus> Controller<L, B> {
    pub fn new(
        supervisor: ConnectivitySupervisor<L>,
        dispatcher: CommandDispatcher<B>,
        updates: UpdateLifecycleManager,
        update_rx: mpsc::Receiver<UpdateEvent>,
        command_rx: mpsc::Receiver<PendingCommand>,
        loop_interval: Duration,
    ) -> Self {
        Self {
            supervisor,
            dispatcher,
            updates,
            update_rx,
            command_rx,
            loop_interval,
            updates_open: true,
            commands_open: true,
        }
    }

    pub fn supervisor(&self) -> &ConnectivitySupervisor<L> {
        &self.supervisor
    }

    pub fn dispatcher(&self) -> &CommandDispatcher<B> {
        &self.dispatcher
    }

    pub fn updates(&self) -> &UpdateLifecycleManager {
        &self.updates
    }

    /// Run one loop iteration
    pub async fn service_once(&mut self) -> ServiceReport {
        let mut report = ServiceReport::default();

        while self.updates_open {
            match self.update_rx.try_recv() {
                Ok(event) => {
                    self.updates.handle(event);
                    report.updates += 1;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => self.updates_open = false,
            }
        }

        self.supervisor.poll().await;

        while self.commands_open {
            match self.command_rx.try_recv() {
                Ok(pending) => {
                    let result = self.dispatcher.dispatch(&pending.command).await;
                    if pending.reply.send(result).is_err() {
                        debug!("Requester for {} went away", pending.command);
                    }
                    report.commands += 1;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => self.commands_open = false,
            }
        }

        report.open = self.updates_open || self.commands_open;
        report
    }

    /// Connect, then loop until every inbound channel has closed
    pub async fn run(mut self) {
        self.supervisor.establish().await;

        let mut ticker = tokio::time::interval(self.loop_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            if !self.service_once().await.open {
                info!("All inbound channels closed, stopping control loop");
                break;
            }
        }
    }
}
