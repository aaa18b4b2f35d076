//! WebSocket connection state machine.
//!
//! Handles the read/write loop for a single WebSocket connection,
//! dispatching incoming commands and forwarding filtered events.

use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast;

use super::messages::{WsCommand, WsMessage, WsMessageType};
use super::subscription::SubscriptionManager;
use crate::domain::{AuthUserId, NetworkEvent, PlayerId};
use crate::error::NetworkError;
use crate::render::render_network;
use crate::service::{NetworkFetch, NetworkService};

/// Runs the read/write loop for a single WebSocket connection.
///
/// - Reads commands from the client and dispatches them.
/// - Forwards matching events from the [`broadcast::Receiver`] to the client.
pub async fn run_connection(
    socket: WebSocket,
    mut event_rx: broadcast::Receiver<NetworkEvent>,
    network: NetworkService,
) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let mut subs = SubscriptionManager::new();

    loop {
        tokio::select! {
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let response = handle_text_message(&text, &mut subs, &network).await;
                        if let Ok(json) = serde_json::to_string(&response)
                            && ws_tx.send(Message::text(json)).await.is_err() {
                                break;
                            }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    _ => {}
                }
            }
            event = event_rx.recv() => {
                match event {
                    Ok(event) => {
                        if !subs.matches(&event) {
                            continue;
                        }
                        let msg = WsMessage::new(
                            uuid::Uuid::new_v4().to_string(),
                            WsMessageType::Event,
                            serde_json::to_value(&event).unwrap_or_default(),
                        );
                        let json = serde_json::to_string(&msg).unwrap_or_default();
                        if ws_tx.send(Message::text(json)).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(lagged = n, "ws client lagged behind event bus");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    tracing::debug!("ws connection closed");
}

/// Handles a text message from the client and builds the reply.
async fn handle_text_message(
    text: &str,
    subs: &mut SubscriptionManager,
    network: &NetworkService,
) -> WsMessage {
    let Ok(msg) = serde_json::from_str::<WsMessage>(text) else {
        return WsMessage::error("", 400, "malformed JSON");
    };
    let Ok(command) = serde_json::from_value::<WsCommand>(msg.payload) else {
        return WsMessage::error(msg.id, 404, "unknown command");
    };

    match command {
        WsCommand::Subscribe { player_ids } => {
            let wildcard = player_ids.iter().any(|s| s == "*");
            let ids = parse_player_ids(&player_ids);
            subs.subscribe(&ids, wildcard);
            WsMessage::new(
                msg.id,
                WsMessageType::Response,
                serde_json::json!({
                    "subscribed": ids.iter().map(ToString::to_string).collect::<Vec<_>>(),
                    "count": subs.count(),
                    "wildcard": subs.is_subscribed_all(),
                }),
            )
        }
        WsCommand::Unsubscribe { player_ids } => {
            let ids = parse_player_ids(&player_ids);
            subs.unsubscribe(&ids);
            WsMessage::new(
                msg.id,
                WsMessageType::Response,
                serde_json::json!({
                    "unsubscribed": ids.iter().map(ToString::to_string).collect::<Vec<_>>(),
                    "remaining_count": subs.count(),
                }),
            )
        }
        WsCommand::GetNetwork { user_id } => {
            let Ok(uuid) = user_id.parse::<uuid::Uuid>() else {
                return WsMessage::error(msg.id, 400, "invalid user_id");
            };
            match network.get_network(Some(AuthUserId::from_uuid(uuid))).await {
                Ok(outcome) => network_reply(msg.id, &outcome, network.cache().throttle()),
                Err(err) => WsMessage::error(msg.id, err.error_code(), err.to_string()),
            }
        }
    }
}

fn network_reply(id: String, outcome: &NetworkFetch, throttle: Duration) -> WsMessage {
    let Some(network) = outcome.network() else {
        return match outcome {
            NetworkFetch::Throttled(None) => {
                let err = NetworkError::Throttled {
                    retry_after_ms: u64::try_from(throttle.as_millis()).unwrap_or(u64::MAX),
                };
                WsMessage::error(id, err.error_code(), err.to_string())
            }
            _ => WsMessage::error(id, 404, outcome.source()),
        };
    };
    WsMessage::new(
        id,
        WsMessageType::Response,
        serde_json::json!({
            "source": outcome.source(),
            "network": network.as_ref(),
            "view": render_network(network),
        }),
    )
}

fn parse_player_ids(raw: &[String]) -> Vec<PlayerId> {
    raw.iter()
        .filter_map(|s| s.parse::<uuid::Uuid>().ok())
        .map(PlayerId::from_uuid)
        .collect()
}

#[cfg(test)]
#[allow(clippy::panic, clippy::indexing_slicing)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::persistence::{MemoryStore, NetworkStore};
    use crate::service::NetworkCache;

    fn network() -> NetworkService {
        NetworkService::new(
            Arc::new(MemoryStore::new()),
            Arc::new(NetworkCache::new(
                Duration::from_secs(30),
                Duration::from_secs(2),
            )),
        )
    }

    fn command(payload: serde_json::Value) -> String {
        let msg = WsMessage::new("req-1", WsMessageType::Command, payload);
        let Ok(json) = serde_json::to_string(&msg) else {
            panic!("serialize failed");
        };
        json
    }

    #[tokio::test]
    async fn malformed_json_is_an_error() {
        let mut subs = SubscriptionManager::new();
        let reply = handle_text_message("{nope", &mut subs, &network()).await;
        assert_eq!(reply.msg_type, WsMessageType::Error);
        assert_eq!(reply.payload["code"], 400);
    }

    #[tokio::test]
    async fn subscribe_then_unsubscribe() {
        let mut subs = SubscriptionManager::new();
        let id = PlayerId::new();
        let text = command(serde_json::json!({
            "command": "subscribe",
            "player_ids": [id.to_string(), "not-a-uuid"],
        }));
        let reply = handle_text_message(&text, &mut subs, &network()).await;
        assert_eq!(reply.msg_type, WsMessageType::Response);
        assert_eq!(reply.id, "req-1");
        assert_eq!(reply.payload["count"], 1);

        let text = command(serde_json::json!({
            "command": "unsubscribe",
            "player_ids": [id.to_string()],
        }));
        let reply = handle_text_message(&text, &mut subs, &network()).await;
        assert_eq!(reply.payload["remaining_count"], 0);
    }

    #[tokio::test]
    async fn get_network_for_unknown_user() {
        let mut subs = SubscriptionManager::new();
        let text = command(serde_json::json!({
            "command": "get_network",
            "user_id": uuid::Uuid::new_v4().to_string(),
        }));
        let reply = handle_text_message(&text, &mut subs, &network()).await;
        assert_eq!(reply.msg_type, WsMessageType::Error);
        assert_eq!(reply.payload["message"], "profile_not_found");
    }

    #[tokio::test]
    async fn get_network_returns_view() {
        let store = Arc::new(MemoryStore::new());
        let Ok(me) = store
            .insert_player(crate::domain::NewPlayer {
                auth_user_id: AuthUserId::new(),
                alias: "Wren".to_string(),
                role: crate::domain::PlayerRole::Player,
            })
            .await
        else {
            panic!("insert failed");
        };
        let network = NetworkService::new(
            store,
            Arc::new(NetworkCache::new(
                Duration::from_secs(30),
                Duration::from_secs(2),
            )),
        );
        let mut subs = SubscriptionManager::new();
        let text = command(serde_json::json!({
            "command": "get_network",
            "user_id": me.auth_user_id.to_string(),
        }));
        let reply = handle_text_message(&text, &mut subs, &network).await;
        assert_eq!(reply.msg_type, WsMessageType::Response);
        assert_eq!(reply.payload["source"], "fresh");
        assert_eq!(reply.payload["network"]["player"]["alias"], "Wren");
        assert_eq!(reply.payload["view"]["children"][0]["body"]["kind"], "root");
    }

    #[test]
    fn throttled_without_value_uses_rate_limit_code() {
        let reply = network_reply(
            "net-1".to_string(),
            &NetworkFetch::Throttled(None),
            Duration::from_secs(2),
        );
        assert_eq!(reply.msg_type, WsMessageType::Error);
        assert_eq!(reply.payload["code"], 2301);

        let missing = network_reply(
            "net-2".to_string(),
            &NetworkFetch::ProfileNotFound,
            Duration::from_secs(2),
        );
        assert_eq!(missing.payload["code"], 404);
    }
}
