//! WebSocket message types: envelope, commands, and events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::NotificationId;

/// Top-level WebSocket message envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WsMessage {
    /// Client-provided ID for requests; server-generated for events.
    pub id: String,
    /// Message type discriminator.
    #[serde(rename = "type")]
    pub msg_type: WsMessageType,
    /// ISO-8601 timestamp.
    pub timestamp: DateTime<Utc>,
    /// Variant-specific payload.
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl WsMessage {
    /// Server-pushed event with a fresh id.
    #[must_use]
    pub fn event(payload: serde_json::Value) -> Self {
        Self::new(uuid::Uuid::new_v4().to_string(), WsMessageType::Event, payload)
    }

    /// Reply to the command with id `id`.
    #[must_use]
    pub fn response(id: impl Into<String>, payload: serde_json::Value) -> Self {
        Self::new(id.into(), WsMessageType::Response, payload)
    }

    /// Error reply; `id` is empty when the request could not be parsed.
    #[must_use]
    pub fn error(id: impl Into<String>, code: u32, message: impl Into<String>) -> Self {
        Self::new(
            id.into(),
            WsMessageType::Error,
            serde_json::json!({ "code": code, "message": message.into() }),
        )
    }

    fn new(id: String, msg_type: WsMessageType, payload: serde_json::Value) -> Self {
        Self {
            id,
            msg_type,
            timestamp: Utc::now(),
            payload,
        }
    }

    /// Serializes to the text frame body.
    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Discriminator for WebSocket message types.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WsMessageType {
    /// Client → Server command.
    Command,
    /// Server → Client response to a command.
    Response,
    /// Server → Client broadcast event.
    Event,
    /// Server → Client error.
    Error,
}

/// Commands that a client can send over WebSocket, carried in the payload
/// of a `command` message.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum WsCommand {
    /// Liveness probe; answered with `pong`.
    Ping,
    /// Mark one of the session user's notifications read.
    MarkRead {
        /// Notification to mark.
        notification_id: NotificationId,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_uses_type_key() {
        let json = WsMessage::response("req-1", serde_json::json!({"pong": true})).to_json();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap_or_default();
        assert_eq!(value["type"], "response");
        assert_eq!(value["id"], "req-1");
        assert_eq!(value["payload"]["pong"], true);
    }

    #[test]
    fn commands_parse_from_payload() {
        let ping: Result<WsCommand, _> =
            serde_json::from_value(serde_json::json!({"command": "ping"}));
        assert_eq!(ping.ok(), Some(WsCommand::Ping));

        let id = NotificationId::new();
        let mark: Result<WsCommand, _> = serde_json::from_value(
            serde_json::json!({"command": "mark_read", "notification_id": id.to_string()}),
        );
        assert_eq!(mark.ok(), Some(WsCommand::MarkRead { notification_id: id }));

        let unknown: Result<WsCommand, _> =
            serde_json::from_value(serde_json::json!({"command": "swap"}));
        assert!(unknown.is_err());
    }

    #[test]
    fn error_payload_carries_code() {
        let msg = WsMessage::error("", 1001, "malformed JSON");
        assert_eq!(msg.msg_type, WsMessageType::Error);
        assert_eq!(msg.payload["code"], 1001);
    }
}
