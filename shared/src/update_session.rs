//! OTA Update Session State Machine
//!
//! Tracks one firmware transfer at a time:
//! ```text
//! Idle --start--> InProgress --progress--> InProgress --end--> Completed --> Idle
//!                      \--error--> Failed --> Idle
//! ```
//! Completed and Failed are reported and then immediately folded back to Idle;
//! the last terminal state is kept as `last_outcome`.

use thiserror::Error;

use crate::policy::PROGRESS_STEP_PERCENT;

/// Which image an update session writes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateKind {
    /// Application firmware image
    Application,
    /// Filesystem image
    Filesystem,
}

impl std::fmt::Display for UpdateKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UpdateKind::Application => write!(f, "application"),
            UpdateKind::Filesystem => write!(f, "filesystem"),
        }
    }
}

/// Reasons an update session can fail
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateFailure {
    #[error("Auth Failed")]
    AuthRejected,

    #[error("Begin Failed")]
    BeginFailed,

    #[error("Connect Failed")]
    ConnectionDropped,

    #[error("Receive Failed")]
    ReceiveTruncated,

    #[error("End Failed")]
    FinalizeFailed,
}

/// Current state of the update session
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum UpdateSession {
    #[default]
    Idle,
    InProgress {
        kind: UpdateKind,
        progress_percent: u8,
        /// Highest multiple of ten already reported
        last_reported_decile: u8,
    },
    Completed {
        kind: UpdateKind,
    },
    Failed(UpdateFailure),
}

impl UpdateSession {
    pub fn is_in_progress(&self) -> bool {
        matches!(self, UpdateSession::InProgress { .. })
    }
}

/// Result of feeding one protocol callback into the machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateTransition {
    /// A new session began
    Started(UpdateKind),
    /// Progress recorded; `reported` holds every decile boundary newly crossed
    Progress { percent: u8, reported: Vec<u8> },
    /// Session finished and was reset to Idle
    Completed(UpdateKind),
    /// Session failed and was reset to Idle
    Failed(UpdateFailure),
    /// Start while another session is running; nothing changed
    Rejected { active: UpdateKind },
    /// Callback arrived out of order; nothing changed
    Ignored { callback: &'static str },
}

/// Compute `floor(current / total * 100)`, clamped to 100; a zero total is 0%
pub fn percent_of(current: u32, total: u32) -> u8 {
    if total == 0 {
        return 0;
    }
    let percent = (current as u64 * 100) / total as u64;
    percent.min(100) as u8
}

/// The update session state machine
#[derive(Debug, Default)]
pub struct UpdateStateMachine {
    session: UpdateSession,
    last_outcome: Option<UpdateSession>,
}

impl UpdateStateMachine {
    /// Create a new state machine in Idle state
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the current session
    pub fn session(&self) -> &UpdateSession {
        &self.session
    }

    /// Get the terminal state of the most recent finished session
    pub fn last_outcome(&self) -> Option<&UpdateSession> {
        self.last_outcome.as_ref()
    }

    pub fn start(&mut self, kind: UpdateKind) -> UpdateTransition {
        if let UpdateSession::InProgress { kind: active, .. } = self.session {
            return UpdateTransition::Rejected { active };
        }

        self.session = UpdateSession::InProgress {
            kind,
            progress_percent: 0,
            last_reported_decile: 0,
        };
        UpdateTransition::Started(kind)
    }

    pub fn progress(&mut self, current: u32, total: u32) -> UpdateTransition {
        let UpdateSession::InProgress {
            progress_percent,
            last_reported_decile,
            ..
        } = &mut self.session
        else {
            return UpdateTransition::Ignored { callback: "progress" };
        };

        // Progress never moves backwards within a session
        let percent = percent_of(current, total).max(*progress_percent);
        *progress_percent = percent;

        let reached = percent / PROGRESS_STEP_PERCENT * PROGRESS_STEP_PERCENT;
        let reported: Vec<u8> = (*last_reported_decile + PROGRESS_STEP_PERCENT..=reached)
            .step_by(PROGRESS_STEP_PERCENT as usize)
            .collect();
        if reached > *last_reported_decile {
            *last_reported_decile = reached;
        }

        UpdateTransition::Progress { percent, reported }
    }

    pub fn end(&mut self) -> UpdateTransition {
        let UpdateSession::InProgress { kind, .. } = self.session else {
            return UpdateTransition::Ignored { callback: "end" };
        };

        self.finish(UpdateSession::Completed { kind });
        UpdateTransition::Completed(kind)
    }

    /// Errors are accepted from Idle too, for failures before a session starts
    pub fn error(&mut self, reason: UpdateFailure) -> UpdateTransition {
        self.finish(UpdateSession::Failed(reason));
        UpdateTransition::Failed(reason)
    }

    fn finish(&mut self, outcome: UpdateSession) {
        self.last_outcome = Some(outcome);
        self.session = UpdateSession::Idle;
    }
}
