//! Route handlers
//!
//! Handlers never touch core state: a command is handed to the control loop
//! with a oneshot for the result.

use crate::command::DispatchResult;
use crate::controller::PendingCommand;
use anyhow::{Context, Result};
use bytes::Bytes;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use smarthome_shared::codec::{decode_command, encode_reply, CodecError};
use smarthome_shared::{CommandReply, VersionInfo};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info};

#[derive(Clone)]
pub struct ApiState {
    commands: mpsc::Sender<PendingCommand>,
    version: Arc<VersionInfo>,
}

impl ApiState {
    pub fn new(commands: mpsc::Sender<PendingCommand>, version: Arc<VersionInfo>) -> Self {
        Self { commands, version }
    }
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/command", post(post_command))
        .route("/version", get(get_version))
        .with_state(state)
}

/// Serve the API until the listener fails
pub async fn serve(listener: TcpListener, state: ApiState) -> Result<()> {
    info!("HTTP API listening on {}", listener.local_addr()?);
    axum::serve(listener, router(state))
        .await
        .context("HTTP server failed")
}

async fn get_version(State(state): State<ApiState>) -> Json<VersionInfo> {
    Json(state.version.as_ref().clone())
}

async fn post_command(State(state): State<ApiState>, body: Bytes) -> Response {
    let command = match decode_command(&body) {
        Ok(command) => command,
        Err(e) => {
            debug!("Rejecting command body: {}", e);
            let (status, message) = match &e {
                CodecError::BodyTooLarge(_) => (StatusCode::PAYLOAD_TOO_LARGE, "Body too large"),
                e if e.is_invalid_command() => (StatusCode::BAD_REQUEST, "Invalid command"),
                _ => (StatusCode::BAD_REQUEST, "Invalid JSON"),
            };
            return reply(status, &CommandReply::rejected(None, message));
        }
    };

    let (tx, rx) = oneshot::channel();
    let pending = PendingCommand {
        command: command.clone(),
        reply: tx,
    };
    if state.commands.send(pending).await.is_err() {
        return loop_unavailable(&command.name);
    }

    match rx.await {
        Ok(DispatchResult::Accepted { command, reading }) => {
            let mut body = CommandReply::accepted(command.name);
            if let Some(reading) = reading {
                body = body.with_reading(reading.to_reply());
            }
            reply(StatusCode::OK, &body)
        }
        Ok(DispatchResult::Rejected(reason)) => reply(
            StatusCode::BAD_REQUEST,
            &CommandReply::rejected(Some(command.name), reason.to_string()),
        ),
        Err(_) => loop_unavailable(&command.name),
    }
}

fn loop_unavailable(name: &str) -> Response {
    reply(
        StatusCode::SERVICE_UNAVAILABLE,
        &CommandReply::rejected(Some(name.to_string()), "Control loop not running"),
    )
}

fn reply(status: StatusCode, body: &CommandReply) -> Response {
    match encode_reply(body) {
        Ok(bytes) => (status, [(header::CONTENT_TYPE, "application/json")], bytes).into_response(),
        Err(e) => {
            error!("Failed to encode reply: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
