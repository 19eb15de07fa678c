//! Test doubles shared by the module tests

use crate::clock::Clock;
use crate::devices::{Actuator, DeviceBus, Positional, Sensor, SensorError};
use crate::events::{EventSink, NodeEvent};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::mpsc;

/// Virtual clock: `sleep` returns immediately and advances time
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Mutex<Duration>,
    sleeps: Mutex<Vec<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock().unwrap() += by;
    }

    /// Every sleep requested so far
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }
}

#[async_trait]
impl Clock for ManualClock {
    fn now(&self) -> Duration {
        *self.now.lock().unwrap()
    }

    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
        self.advance(duration);
    }
}

/// One call made against a [`RecordingBus`]
#[derive(Debug, Clone, PartialEq)]
pub enum BusCall {
    Set(Actuator, bool),
    Open(Positional),
    Close(Positional),
    Read(Sensor),
}

/// Device bus that records calls and keeps relay state
#[derive(Debug, Default)]
pub struct RecordingBus {
    pub calls: Vec<BusCall>,
    pub relays: HashMap<Actuator, bool>,
    pub readings: HashMap<Sensor, f32>,
}

impl RecordingBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reading(mut self, sensor: Sensor, value: f32) -> Self {
        self.readings.insert(sensor, value);
        self
    }

    pub fn relay(&self, id: Actuator) -> bool {
        self.relays.get(&id).copied().unwrap_or(false)
    }
}

impl DeviceBus for RecordingBus {
    fn set_actuator(&mut self, id: Actuator, on: bool) {
        self.calls.push(BusCall::Set(id, on));
        self.relays.insert(id, on);
    }

    fn open_positional(&mut self, id: Positional) {
        self.calls.push(BusCall::Open(id));
    }

    fn close_positional(&mut self, id: Positional) {
        self.calls.push(BusCall::Close(id));
    }

    fn read_sensor(&mut self, id: Sensor) -> Result<f32, SensorError> {
        self.calls.push(BusCall::Read(id));
        self.readings
            .get(&id)
            .copied()
            .ok_or(SensorError::NoValue(id))
    }
}

/// Sink that forwards every event over a channel
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<NodeEvent>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<NodeEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl EventSink for ChannelSink {
    fn emit(&self, event: NodeEvent) {
        let _ = self.tx.send(event);
    }
}

/// Collect every event currently queued
pub fn drain(rx: &mut mpsc::UnboundedReceiver<NodeEvent>) -> Vec<NodeEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
