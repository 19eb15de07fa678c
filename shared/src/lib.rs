//! Smart Home Shared Protocol Types
//!
//! This crate provides the wire types, JSON codec and pure state machines
//! shared by the node binary and its tests.

pub mod codec;
pub mod device;
pub mod link_state;
pub mod update_session;

use serde::{Deserialize, Serialize};

pub use device::{Actuator, Positional, Sensor, SensorError, SensorReading};
pub use link_state::{ConnectionState, LinkSignal, LinkTracker};
pub use update_session::{UpdateFailure, UpdateKind, UpdateSession, UpdateStateMachine, UpdateTransition};

/// Policy parameters for the node
pub mod policy {
    /// Maximum association polls before a (re)connect gives up
    pub const MAX_CONNECT_ATTEMPTS: u32 = 20;

    /// Delay between association polls in milliseconds
    pub const CONNECT_POLL_INTERVAL_MS: u64 = 500;

    /// Time the curtain servo needs to reach its target angle
    pub const CURTAIN_SETTLE_MS: u64 = 1000;

    /// Servo angle for an open curtain
    pub const CURTAIN_OPEN_ANGLE: u8 = 90;

    /// Servo angle for a closed curtain
    pub const CURTAIN_CLOSED_ANGLE: u8 = 0;

    /// Reported in place of a value when a sensor read fails
    pub const SENSOR_ERROR_SENTINEL: f32 = -999.0;

    /// Default OTA listener port
    pub const OTA_PORT: u16 = 3232;

    /// Progress notifications are emitted once per this many percent
    pub const PROGRESS_STEP_PERCENT: u8 = 10;
}

/// A command parsed from a request body
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Command {
    pub name: String,
}

impl Command {
    /// Create a command from its wire name
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

/// Raw request body of the command endpoint
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CommandRequest {
    #[serde(default)]
    pub cmd: Option<String>,
}

/// Outcome field of a command reply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplyStatus {
    Accepted,
    Rejected,
}

/// A sensor value as rendered on the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadingReply {
    pub sensor: String,
    pub value: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Response body of the command endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandReply {
    pub status: ReplyStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cmd: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reading: Option<ReadingReply>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CommandReply {
    /// Reply for an accepted command
    pub fn accepted(cmd: impl Into<String>) -> Self {
        Self {
            status: ReplyStatus::Accepted,
            cmd: Some(cmd.into()),
            reading: None,
            error: None,
        }
    }

    /// Reply for a rejected request
    pub fn rejected(cmd: Option<String>, error: impl Into<String>) -> Self {
        Self {
            status: ReplyStatus::Rejected,
            cmd,
            reading: None,
            error: Some(error.into()),
        }
    }

    /// Attach a sensor reading
    pub fn with_reading(mut self, reading: ReadingReply) -> Self {
        self.reading = Some(reading);
        self
    }
}

/// Firmware identity, fixed for the life of the process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionInfo {
    pub version: String,
    #[serde(rename = "enableRollback")]
    pub rollback_enabled: bool,
}

impl VersionInfo {
    pub fn new(version: impl Into<String>, rollback_enabled: bool) -> Self {
        Self {
            version: version.into(),
            rollback_enabled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_info_wire_names() {
        let info = VersionInfo::new("1.0.0", true);
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["version"], "1.0.0");
        assert_eq!(json["enableRollback"], true);
    }

    #[test]
    fn test_accepted_reply_omits_empty_fields() {
        let reply = CommandReply::accepted("mo_rem");
        let json = serde_json::to_string(&reply).unwrap();
        assert_eq!(json, r#"{"status":"accepted","cmd":"mo_rem"}"#);
    }

    #[test]
    fn test_rejected_reply() {
        let reply = CommandReply::rejected(None, "Invalid command");
        assert_eq!(reply.status, ReplyStatus::Rejected);
        assert!(reply.cmd.is_none());
        assert_eq!(reply.error.as_deref(), Some("Invalid command"));
    }
}
