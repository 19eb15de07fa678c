//! Update lifecycle manager - owns the update session and progress reporting

use super::UpdateEvent;
use crate::events::{EventSink, NodeEvent};
use smarthome_shared::{
    UpdateFailure, UpdateKind, UpdateSession, UpdateStateMachine, UpdateTransition, VersionInfo,
};
use std::sync::Arc;
use tracing::debug;

pub struct UpdateLifecycleManager {
    fsm: UpdateStateMachine,
    version: Arc<VersionInfo>,
    sink: Arc<dyn EventSink>,
}

impl UpdateLifecycleManager {
    pub fn new(version: Arc<VersionInfo>, sink: Arc<dyn EventSink>) -> Self {
        Self {
            fsm: UpdateStateMachine::new(),
            version,
            sink,
        }
    }

    pub fn current_version(&self) -> &str {
        &self.version.version
    }

    pub fn rollback_enabled(&self) -> bool {
        self.version.rollback_enabled
    }

    pub fn session(&self) -> &UpdateSession {
        self.fsm.session()
    }

    /// Terminal state of the most recent session
    pub fn last_outcome(&self) -> Option<&UpdateSession> {
        self.fsm.last_outcome()
    }

    /// Route one transport callback
    pub fn handle(&mut self, event: UpdateEvent) -> UpdateTransition {
        match event {
            UpdateEvent::Start(kind) => self.on_start(kind),
            UpdateEvent::Progress { current, total } => self.on_progress(current, total),
            UpdateEvent::End => self.on_end(),
            UpdateEvent::Error(reason) => self.on_error(reason),
        }
    }

    pub fn on_start(&mut self, kind: UpdateKind) -> UpdateTransition {
        let transition = self.fsm.start(kind);
        match transition {
            UpdateTransition::Started(kind) => self.sink.emit(NodeEvent::UpdateStarted { kind }),
            UpdateTransition::Rejected { active } => {
                self.sink.emit(NodeEvent::UpdateOverlap { active })
            }
            _ => {}
        }
        transition
    }

    pub fn on_progress(&mut self, current: u32, total: u32) -> UpdateTransition {
        let transition = self.fsm.progress(current, total);
        match &transition {
            UpdateTransition::Progress { reported, .. } => {
                for &percent in reported {
                    self.sink.emit(NodeEvent::UpdateProgress { percent });
                }
            }
            other => self.ignored(other),
        }
        transition
    }

    pub fn on_end(&mut self) -> UpdateTransition {
        let transition = self.fsm.end();
        match &transition {
            UpdateTransition::Completed(kind) => {
                self.sink.emit(NodeEvent::UpdateCompleted { kind: *kind })
            }
            other => self.ignored(other),
        }
        transition
    }

    pub fn on_error(&mut self, reason: UpdateFailure) -> UpdateTransition {
        let transition = self.fsm.error(reason);
        self.sink.emit(NodeEvent::UpdateFailed { reason });
        transition
    }

    fn ignored(&self, transition: &UpdateTransition) {
        if let UpdateTransition::Ignored { callback } = transition {
            debug!("Ignoring update {} callback with no active session", callback);
        }
    }
}
