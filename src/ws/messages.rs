//! WebSocket message types: envelope, commands, and events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

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
    pub payload: serde_json::Value,
}

impl WsMessage {
    /// Builds a server message of the given type.
    #[must_use]
    pub fn new(id: impl Into<String>, msg_type: WsMessageType, payload: serde_json::Value) -> Self {
        Self {
            id: id.into(),
            msg_type,
            timestamp: Utc::now(),
            payload,
        }
    }

    /// Builds an error message with a numeric code.
    #[must_use]
    pub fn error(id: impl Into<String>, code: u32, message: impl Into<String>) -> Self {
        Self::new(
            id,
            WsMessageType::Error,
            serde_json::json!({ "code": code, "message": message.into() }),
        )
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

/// Commands that a client can send over WebSocket, carried in the
/// envelope's `payload`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum WsCommand {
    /// Subscribe to events touching specific players.
    Subscribe {
        /// Player IDs to subscribe to. Use `["*"]` for all players.
        player_ids: Vec<String>,
    },
    /// Unsubscribe from events for specific players.
    Unsubscribe {
        /// Player IDs to unsubscribe from.
        player_ids: Vec<String>,
    },
    /// Fetch the aggregated network for an auth user (cache and throttle
    /// apply as for the REST endpoint).
    GetNetwork {
        /// Auth user ID.
        user_id: String,
    },
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn subscribe_command_parses_from_payload() {
        let payload = serde_json::json!({ "command": "subscribe", "player_ids": ["*"] });
        let Ok(WsCommand::Subscribe { player_ids }) = serde_json::from_value(payload) else {
            panic!("expected subscribe");
        };
        assert_eq!(player_ids, vec!["*".to_string()]);
    }

    #[test]
    fn unknown_command_is_rejected() {
        let payload = serde_json::json!({ "command": "delete_player", "player_id": "x" });
        assert!(serde_json::from_value::<WsCommand>(payload).is_err());
    }
}
