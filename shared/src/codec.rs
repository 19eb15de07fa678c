//! JSON codec for the command endpoint
//!
//! Request bodies are a single object:
//! ```text
//! { "cmd": "<command name>" }
//! ```
//!
//! Anything else (invalid JSON, a missing or empty `cmd`) is a client error.

use bytes::Bytes;
use thiserror::Error;

use crate::{Command, CommandReply, CommandRequest};

/// Maximum request body size (4 KB) accepted by the decoder
pub const MAX_BODY_SIZE: usize = 4 * 1024;

/// Errors that can occur during encoding/decoding
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Body too large: {0} bytes (max: {MAX_BODY_SIZE})")]
    BodyTooLarge(usize),

    #[error("Invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Request body is not a JSON object")]
    NotAnObject,

    #[error("Missing command field")]
    MissingCommand,

    #[error("Empty command")]
    EmptyCommand,
}

impl CodecError {
    /// Whether the body parsed but carried no usable command
    pub fn is_invalid_command(&self) -> bool {
        matches!(self, CodecError::MissingCommand | CodecError::EmptyCommand)
    }
}

/// Decode a command request body
pub fn decode_command(body: &[u8]) -> Result<Command, CodecError> {
    if body.len() > MAX_BODY_SIZE {
        return Err(CodecError::BodyTooLarge(body.len()));
    }

    // Derived struct deserializers also accept sequences; only an object is a request
    let value: serde_json::Value = serde_json::from_slice(body)?;
    if !value.is_object() {
        return Err(CodecError::NotAnObject);
    }
    let request: CommandRequest = serde_json::from_value(value)?;

    match request.cmd {
        None => Err(CodecError::MissingCommand),
        Some(name) if name.is_empty() => Err(CodecError::EmptyCommand),
        Some(name) => Ok(Command::new(name)),
    }
}

/// Encode a reply into a JSON body
pub fn encode_reply(reply: &CommandReply) -> Result<Bytes, CodecError> {
    Ok(Bytes::from(serde_json::to_vec(reply)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_command() {
        let cmd = decode_command(br#"{"cmd":"mo_rem"}"#).expect("decode failed");
        assert_eq!(cmd.name, "mo_rem");
    }

    #[test]
    fn test_decode_keeps_whitespace() {
        // Names are matched verbatim later, so the codec must not trim
        let cmd = decode_command(br#"{"cmd":" bat_den "}"#).expect("decode failed");
        assert_eq!(cmd.name, " bat_den ");
    }

    #[test]
    fn test_decode_ignores_extra_fields() {
        let cmd = decode_command(br#"{"cmd":"do_am","source":"voice"}"#).expect("decode failed");
        assert_eq!(cmd.name, "do_am");
    }

    #[test]
    fn test_missing_command() {
        let result = decode_command(b"{}");
        assert!(matches!(result, Err(CodecError::MissingCommand)));
    }

    #[test]
    fn test_empty_command() {
        let result = decode_command(br#"{"cmd":""}"#);
        assert!(matches!(result, Err(CodecError::EmptyCommand)));
        assert!(result.unwrap_err().is_invalid_command());
    }

    #[test]
    fn test_invalid_json() {
        let result = decode_command(b"{\"cmd\":");
        assert!(matches!(result, Err(CodecError::InvalidJson(_))));

        let result = decode_command(b"bat_den");
        assert!(matches!(result, Err(CodecError::InvalidJson(_))));
    }

    #[test]
    fn test_non_object_bodies_rejected() {
        let bodies: [&[u8]; 5] = [br#"["bat_den"]"#, b"[]", br#""bat_den""#, b"42", b"null"];
        for body in bodies {
            let result = decode_command(body);
            assert!(
                matches!(result, Err(CodecError::NotAnObject)),
                "body {:?}",
                String::from_utf8_lossy(body)
            );
            assert!(!result.unwrap_err().is_invalid_command());
        }
    }

    #[test]
    fn test_body_too_large() {
        let body = vec![b' '; MAX_BODY_SIZE + 1];
        let result = decode_command(&body);
        assert!(matches!(result, Err(CodecError::BodyTooLarge(_))));
    }

    #[test]
    fn test_encode_reply() {
        let bytes = encode_reply(&CommandReply::accepted("bat_tv")).expect("encode failed");
        assert_eq!(&bytes[..], br#"{"status":"accepted","cmd":"bat_tv"}"#);
    }
}
