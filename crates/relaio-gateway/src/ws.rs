// SPDX-FileCopyrightText: 2026 Relaio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WebSocket protocol for visitors and admins.
//!
//! Client -> Server (JSON):
//! ```json
//! {"action": "join", "display_name": "Ada"}
//! {"action": "rejoin", "thread_id": "..."}
//! {"action": "admin_join", "token": "..."}
//! {"action": "heartbeat", "thread_id": "..."}
//! {"action": "message_to_admin", "thread_id": "...", "kind": "text", "text": "hi"}
//! {"action": "message_to_visitor", "thread_id": "...", "kind": "text", "text": "hello"}
//! ```
//!
//! Server -> Client: [`FanoutEvent`] envelopes
//! (`{"event": "...", "data": {...}}`).

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use relaio_core::RelaioError;
use relaio_core::traits::publisher::ADMIN_ROOM;
use relaio_core::types::{FanoutEvent, MessageKind, ThreadId};

use crate::server::GatewayState;

/// WebSocket message from a client.
#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
enum WsAction {
    Join {
        #[serde(default)]
        display_name: Option<String>,
    },
    Rejoin {
        thread_id: String,
    },
    AdminJoin {
        #[serde(default)]
        token: Option<String>,
    },
    Heartbeat {
        thread_id: String,
    },
    MessageToAdmin {
        thread_id: String,
        #[serde(default = "default_kind")]
        kind: MessageKind,
        #[serde(default)]
        text: String,
        #[serde(default)]
        file_url: String,
    },
    MessageToVisitor {
        thread_id: String,
        #[serde(default = "default_kind")]
        kind: MessageKind,
        #[serde(default)]
        text: String,
        #[serde(default)]
        file_url: String,
    },
}

fn default_kind() -> MessageKind {
    MessageKind::Text
}

/// WebSocket upgrade handler.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<GatewayState>) -> Response {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// Handle an individual WebSocket connection.
///
/// One sender task forwards room emissions to the client; the receive
/// loop dispatches client actions into the relay.
async fn handle_socket(socket: WebSocket, state: GatewayState) {
    let (mut ws_sender, mut ws_receiver) = socket.split();
    let ws_id = uuid::Uuid::new_v4().to_string();

    let (tx, mut rx) = mpsc::channel::<String>(64);

    let sender_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if ws_sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    });

    // Set once this connection authenticates as an admin.
    let mut is_admin = false;

    while let Some(Ok(msg)) = ws_receiver.next().await {
        match msg {
            Message::Text(text) => {
                let text_str: &str = &text;
                let action: WsAction = match serde_json::from_str(text_str) {
                    Ok(v) => v,
                    Err(e) => {
                        warn!(ws_id = %ws_id, "invalid WebSocket message: {e}");
                        continue;
                    }
                };
                handle_action(&state, &ws_id, &tx, &mut is_admin, action).await;
            }
            Message::Close(_) => break,
            _ => {} // Binary and pings are handled by the tungstenite layer.
        }
    }

    state.rooms.leave_all(&ws_id);
    sender_task.abort();
    debug!(ws_id = %ws_id, "websocket connection closed");
}

async fn handle_action(
    state: &GatewayState,
    ws_id: &str,
    tx: &mpsc::Sender<String>,
    is_admin: &mut bool,
    action: WsAction,
) {
    match action {
        WsAction::Join { display_name } => {
            match state.relay.join_visitor(display_name.as_deref()).await {
                Ok(thread) => {
                    state.rooms.join(thread.id.as_str(), ws_id, tx.clone());
                    direct_send(tx, &FanoutEvent::Joined { thread_id: thread.id }).await;
                }
                Err(e) => {
                    warn!(error = %e, "visitor join failed");
                    direct_send(
                        tx,
                        &FanoutEvent::MessageError {
                            kind: "join_failed".to_string(),
                            message: "Could not start a conversation.".to_string(),
                        },
                    )
                    .await;
                }
            }
        }
        WsAction::Rejoin { thread_id } => {
            let thread_id = ThreadId(thread_id);
            match state.relay.thread_exists(&thread_id).await {
                Ok(true) => {
                    state.rooms.join(thread_id.as_str(), ws_id, tx.clone());
                    direct_send(tx, &FanoutEvent::Joined { thread_id }).await;
                }
                Ok(false) => {
                    warn!(thread_id = %thread_id, "rejoin to unknown thread");
                    direct_send(
                        tx,
                        &FanoutEvent::RejoinFailed {
                            thread_id,
                            message: "Conversation not found, starting a new one.".to_string(),
                        },
                    )
                    .await;
                }
                Err(e) => warn!(error = %e, "rejoin lookup failed"),
            }
        }
        WsAction::AdminJoin { token } => {
            if state.auth.token_matches(token.as_deref()) {
                *is_admin = true;
                state.rooms.join(ADMIN_ROOM, ws_id, tx.clone());
                debug!(ws_id = %ws_id, "admin joined broadcast room");
            } else {
                warn!(ws_id = %ws_id, "admin join rejected");
                direct_send(
                    tx,
                    &FanoutEvent::MessageError {
                        kind: "unauthorized".to_string(),
                        message: "Admin authentication failed.".to_string(),
                    },
                )
                .await;
            }
        }
        WsAction::Heartbeat { thread_id } => {
            let thread_id = ThreadId(thread_id);
            if let Err(e) = state.relay.touch_thread(&thread_id).await {
                warn!(error = %e, thread_id = %thread_id, "heartbeat failed");
            }
        }
        WsAction::MessageToAdmin {
            thread_id,
            kind,
            text,
            file_url,
        } => {
            let thread_id = ThreadId(thread_id);
            let result = state
                .relay
                .on_visitor_message(ws_id, &thread_id, kind, &text, &file_url)
                .await;
            report_relay_error(tx, result).await;
        }
        WsAction::MessageToVisitor {
            thread_id,
            kind,
            text,
            file_url,
        } => {
            if !*is_admin {
                direct_send(
                    tx,
                    &FanoutEvent::MessageError {
                        kind: "unauthorized".to_string(),
                        message: "Only admins may send to visitors.".to_string(),
                    },
                )
                .await;
                return;
            }
            let thread_id = ThreadId(thread_id);
            let result = state
                .relay
                .on_admin_message(ws_id, &thread_id, kind, &text, &file_url)
                .await;
            report_relay_error(tx, result).await;
        }
    }
}

/// Surface relay rejections back to the sending socket.
///
/// Persistence failures were already emitted to the relevant room by the
/// orchestrator; gating rejections are reported to the sender only.
async fn report_relay_error<T>(tx: &mpsc::Sender<String>, result: Result<T, RelaioError>) {
    match result {
        Ok(_) => {}
        Err(RelaioError::RateLimited { retry_after_secs }) => {
            direct_send(
                tx,
                &FanoutEvent::MessageError {
                    kind: "rate_limit_exceeded".to_string(),
                    message: format!(
                        "You are sending too quickly. Try again in {retry_after_secs}s."
                    ),
                },
            )
            .await;
        }
        Err(RelaioError::ThreadNotFound(id)) => {
            direct_send(
                tx,
                &FanoutEvent::MessageError {
                    kind: "thread_not_found".to_string(),
                    message: format!("Conversation {id} does not exist."),
                },
            )
            .await;
        }
        Err(RelaioError::Validation(message)) => {
            direct_send(
                tx,
                &FanoutEvent::MessageError {
                    kind: "validation".to_string(),
                    message,
                },
            )
            .await;
        }
        Err(e) => debug!(error = %e, "relay rejected message"),
    }
}

async fn direct_send(tx: &mpsc::Sender<String>, event: &FanoutEvent) {
    if let Ok(payload) = serde_json::to_string(event) {
        if tx.send(payload).await.is_err() {
            debug!("direct send to closed connection dropped");
        }
    }
}
