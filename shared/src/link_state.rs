//! Link State Machine
//!
//! Pure transition table for network association. The supervisor drives it
//! with signals observed from the link; nothing here sleeps or does I/O.

/// Association state of the node's network link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionState::Disconnected => write!(f, "disconnected"),
            ConnectionState::Connecting => write!(f, "connecting"),
            ConnectionState::Connected => write!(f, "connected"),
        }
    }
}

/// Signals that can trigger state transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkSignal {
    /// Association requested with the configured credentials
    BeginAssociation,
    /// The network layer reported a successful association
    LinkUp,
    /// The network layer no longer reports an association
    LinkLost,
    /// The attempt budget ran out without a link-up
    AttemptsExhausted,
}

impl ConnectionState {
    /// Get the next state for a signal, if the transition is valid
    pub fn next(self, signal: LinkSignal) -> Option<ConnectionState> {
        use ConnectionState::*;
        use LinkSignal::*;

        match (self, signal) {
            // A new association can start from anywhere
            (_, BeginAssociation) => Some(Connecting),

            // Connected is only reachable through a link-up
            (Connecting, LinkUp) => Some(Connected),
            (Connected, LinkUp) => Some(Connected),

            (Connecting, AttemptsExhausted) => Some(Disconnected),

            (Connected, LinkLost) => Some(Disconnected),
            (Connecting, LinkLost) => Some(Connecting),
            (Disconnected, LinkLost) => Some(Disconnected),

            _ => None,
        }
    }

    /// Apply a signal, leaving the state unchanged on an invalid transition
    pub fn step(self, signal: LinkSignal) -> ConnectionState {
        self.next(signal).unwrap_or(self)
    }
}

/// Result of a transition attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkTransition {
    /// Transition was valid; carries the new state
    Success(ConnectionState),
    /// Transition was invalid from the current state
    Invalid { from: ConnectionState, signal: LinkSignal },
}

/// Connection state plus the bounded attempt counter
#[derive(Debug, Clone)]
pub struct LinkTracker {
    state: ConnectionState,
    attempt_count: u32,
    max_attempts: u32,
}

impl LinkTracker {
    /// Create a tracker in the Disconnected state
    pub fn new(max_attempts: u32) -> Self {
        Self {
            state: ConnectionState::Disconnected,
            attempt_count: 0,
            max_attempts,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    pub fn attempts(&self) -> u32 {
        self.attempt_count
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Whether another attempt fits in the budget
    pub fn has_budget(&self) -> bool {
        self.attempt_count < self.max_attempts
    }

    /// Count one attempt; returns false once the budget is spent
    pub fn record_attempt(&mut self) -> bool {
        if !self.has_budget() {
            return false;
        }
        self.attempt_count += 1;
        true
    }

    /// Process a signal and return the transition result
    pub fn apply(&mut self, signal: LinkSignal) -> LinkTransition {
        match self.state.next(signal) {
            Some(next) => {
                if signal == LinkSignal::BeginAssociation {
                    self.attempt_count = 0;
                }
                self.state = next;
                LinkTransition::Success(next)
            }
            None => LinkTransition::Invalid {
                from: self.state,
                signal,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let tracker = LinkTracker::new(20);
        assert_eq!(tracker.state(), ConnectionState::Disconnected);
        assert_eq!(tracker.attempts(), 0);
    }

    #[test]
    fn test_connect_flow() {
        let state = ConnectionState::Disconnected
            .step(LinkSignal::BeginAssociation)
            .step(LinkSignal::LinkUp);
        assert_eq!(state, ConnectionState::Connected);

        let state = state.step(LinkSignal::LinkLost);
        assert_eq!(state, ConnectionState::Disconnected);
    }

    #[test]
    fn test_link_up_requires_connecting() {
        assert_eq!(ConnectionState::Disconnected.next(LinkSignal::LinkUp), None);
        assert_eq!(
            ConnectionState::Disconnected.step(LinkSignal::LinkUp),
            ConnectionState::Disconnected
        );
    }

    #[test]
    fn test_exhaustion_returns_to_disconnected() {
        let state = ConnectionState::Connecting.step(LinkSignal::AttemptsExhausted);
        assert_eq!(state, ConnectionState::Disconnected);

        // Exhaustion means nothing outside an association attempt
        assert_eq!(ConnectionState::Connected.next(LinkSignal::AttemptsExhausted), None);
    }

    #[test]
    fn test_begin_resets_attempts() {
        let mut tracker = LinkTracker::new(3);
        tracker.apply(LinkSignal::BeginAssociation);
        assert!(tracker.record_attempt());
        assert!(tracker.record_attempt());
        assert_eq!(tracker.attempts(), 2);

        tracker.apply(LinkSignal::AttemptsExhausted);
        tracker.apply(LinkSignal::BeginAssociation);
        assert_eq!(tracker.state(), ConnectionState::Connecting);
        assert_eq!(tracker.attempts(), 0);
    }

    #[test]
    fn test_attempt_budget_is_bounded() {
        let mut tracker = LinkTracker::new(3);
        tracker.apply(LinkSignal::BeginAssociation);

        let granted = (0..10).filter(|_| tracker.record_attempt()).count();
        assert_eq!(granted, 3);
        assert_eq!(tracker.attempts(), 3);
        assert!(!tracker.has_budget());
    }

    #[test]
    fn test_invalid_transition_keeps_state() {
        let mut tracker = LinkTracker::new(3);
        let result = tracker.apply(LinkSignal::LinkUp);
        assert!(matches!(result, LinkTransition::Invalid { .. }));
        assert_eq!(tracker.state(), ConnectionState::Disconnected);
    }
}
