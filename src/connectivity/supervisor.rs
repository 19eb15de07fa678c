//! Connectivity supervisor with bounded, self-healing reconnection

use crate::clock::Clock;
use crate::events::{EventSink, NodeEvent};
use crate::link::{Credentials, LinkStatus, NetworkLink};
use smarthome_shared::policy::{CONNECT_POLL_INTERVAL_MS, MAX_CONNECT_ATTEMPTS};
use smarthome_shared::{ConnectionState, LinkSignal, LinkTracker};
use std::sync::Arc;
use std::time::Duration;

/// Retry policy for (re)association
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Maximum status polls per association attempt
    pub max_attempts: u32,
    /// Delay between status polls
    pub poll_interval: Duration,
    /// Minimum time between an exhausted attempt and the next one.
    /// Zero retries on every poll.
    pub reconnect_cooldown: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        let poll_interval = Duration::from_millis(CONNECT_POLL_INTERVAL_MS);
        Self {
            max_attempts: MAX_CONNECT_ATTEMPTS,
            poll_interval,
            reconnect_cooldown: poll_interval * MAX_CONNECT_ATTEMPTS,
        }
    }
}

/// Owns the link association state and keeps the node connected
pub struct ConnectivitySupervisor<L: NetworkLink> {
    link: L,
    credentials: Credentials,
    tracker: LinkTracker,
    policy: RetryPolicy,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn EventSink>,
    /// Clock time of the last exhausted attempt
    last_failure_at: Option<Duration>,
}

impl<L: NetworkLink> ConnectivitySupervisor<L> {
    pub fn new(
        link: L,
        credentials: Credentials,
        policy: RetryPolicy,
        clock: Arc<dyn Clock>,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            link,
            credentials,
            tracker: LinkTracker::new(policy.max_attempts),
            policy,
            clock,
            sink,
            last_failure_at: None,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.tracker.state()
    }

    pub fn is_connected(&self) -> bool {
        self.tracker.is_connected()
    }

    /// Attempts used by the current or most recent association
    pub fn attempts(&self) -> u32 {
        self.tracker.attempts()
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    /// Associate with the configured credentials.
    ///
    /// Blocks for at most `max_attempts × poll_interval`.
    pub async fn establish(&mut self) -> bool {
        self.tracker.apply(LinkSignal::BeginAssociation);
        self.sink.emit(NodeEvent::Connecting {
            link: self.link.name(),
            max_attempts: self.policy.max_attempts,
        });

        self.link.begin(&self.credentials);
        self.await_association().await
    }

    /// Drop the link and associate again with a fresh attempt budget
    pub async fn reestablish(&mut self) -> bool {
        self.link.disconnect();
        self.tracker.apply(LinkSignal::BeginAssociation);
        self.sink.emit(NodeEvent::Reconnecting {
            link: self.link.name(),
            max_attempts: self.policy.max_attempts,
        });

        self.link.begin(&self.credentials);
        self.await_association().await
    }

    /// Health check, called once per loop iteration
    pub async fn poll(&mut self) {
        match self.tracker.state() {
            ConnectionState::Connected => {
                if self.link.status() != LinkStatus::Connected {
                    self.tracker.apply(LinkSignal::LinkLost);
                    self.sink.emit(NodeEvent::LinkLost);
                    self.reestablish().await;
                }
            }
            ConnectionState::Disconnected => {
                // The link may have associated on its own after we gave up
                if self.link.status() == LinkStatus::Connected {
                    self.tracker.apply(LinkSignal::BeginAssociation);
                    self.link_up();
                } else if self.cooldown_elapsed() {
                    self.reestablish().await;
                }
            }
            // Only observable inside establish/reestablish
            ConnectionState::Connecting => {}
        }
    }

    async fn await_association(&mut self) -> bool {
        while self.tracker.has_budget() {
            if self.link.status() == LinkStatus::Connected {
                return self.link_up();
            }
            self.tracker.record_attempt();
            self.clock.sleep(self.policy.poll_interval).await;
        }

        if self.link.status() == LinkStatus::Connected {
            return self.link_up();
        }

        self.tracker.apply(LinkSignal::AttemptsExhausted);
        self.last_failure_at = Some(self.clock.now());
        self.sink.emit(NodeEvent::ConnectFailed {
            attempts: self.tracker.attempts(),
        });
        false
    }

    fn link_up(&mut self) -> bool {
        self.tracker.apply(LinkSignal::LinkUp);
        self.last_failure_at = None;
        self.sink.emit(NodeEvent::Connected {
            address: self.link.local_addr(),
        });
        true
    }

    fn cooldown_elapsed(&self) -> bool {
        match self.last_failure_at {
            None => true,
            Some(at) => self.clock.now().saturating_sub(at) >= self.policy.reconnect_cooldown,
        }
    }
}
