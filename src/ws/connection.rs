//! WebSocket connection state machine.
//!
//! Handles the read/write loop for a single WebSocket connection,
//! dispatching incoming commands and forwarding the session user's events.

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast;

use super::messages::{WsCommand, WsMessage, WsMessageType};
use crate::domain::{MarketEvent, Session};
use crate::error::MarketError;
use crate::service::NotificationService;

/// Code reported for frames that are not a valid command.
const BAD_FRAME: u32 = 1001;

/// Runs the read/write loop for a single WebSocket connection.
///
/// - Reads commands from the client and answers each one.
/// - Forwards events addressed to `session` from the [`broadcast::Receiver`].
pub async fn run_connection(
    socket: WebSocket,
    session: Session,
    mut event_rx: broadcast::Receiver<MarketEvent>,
    notifications: NotificationService,
) {
    let (mut ws_tx, mut ws_rx) = socket.split();

    loop {
        tokio::select! {
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let reply = handle_text_message(&text, &session, &notifications).await;
                        if ws_tx.send(Message::text(reply.to_json())).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_)) | Err(_)) | None => break,
                    _ => {}
                }
            }
            event = event_rx.recv() => {
                match event {
                    Ok(event) => {
                        if !event.is_addressed_to(session.user_id()) {
                            continue;
                        }
                        let payload = serde_json::to_value(&event).unwrap_or_default();
                        let frame = Message::text(WsMessage::event(payload).to_json());
                        if ws_tx.send(frame).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(
                            lagged = n,
                            user_id = %session.user_id(),
                            "ws client lagged behind event bus"
                        );
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    tracing::debug!(user_id = %session.user_id(), "ws connection closed");
}

/// Handles a text frame from the client and builds the reply.
async fn handle_text_message(
    text: &str,
    session: &Session,
    notifications: &NotificationService,
) -> WsMessage {
    let Ok(msg) = serde_json::from_str::<WsMessage>(text) else {
        return WsMessage::error("", BAD_FRAME, "malformed JSON");
    };
    if msg.msg_type != WsMessageType::Command {
        return WsMessage::error(msg.id, BAD_FRAME, "expected a command message");
    }
    let Ok(command) = serde_json::from_value::<WsCommand>(msg.payload) else {
        return WsMessage::error(msg.id, BAD_FRAME, "unknown command");
    };

    match command {
        WsCommand::Ping => WsMessage::response(msg.id, serde_json::json!({ "pong": true })),
        WsCommand::MarkRead { notification_id } => {
            match notifications.mark_read(session, notification_id).await {
                Ok(()) => WsMessage::response(
                    msg.id,
                    serde_json::json!({ "notification_id": notification_id, "read": true }),
                ),
                Err(err) => error_reply(msg.id, &err),
            }
        }
    }
}

fn error_reply(id: String, err: &MarketError) -> WsMessage {
    if err.is_server_error() {
        tracing::error!(error = %err, "ws command failed");
        WsMessage::error(id, err.error_code(), "something went wrong, please try again later")
    } else {
        WsMessage::error(id, err.error_code(), err.to_string())
    }
}
