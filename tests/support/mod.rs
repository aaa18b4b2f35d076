//! Shared helpers for the HTTP and WebSocket integration tests.

#![allow(dead_code, clippy::panic)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use tabletop_network::api;
use tabletop_network::app_state::AppState;
use tabletop_network::config::NetworkConfig;
use tabletop_network::domain::{AuthUserId, NewPlayer, Player, PlayerRole};
use tabletop_network::error::NetworkError;
use tabletop_network::persistence::{MemoryStore, NetworkStore};
use tabletop_network::service::{EmailDelivery, InviteEmail};

/// Email backend that accepts every message.
#[derive(Debug)]
pub struct AcceptingEmail;

#[async_trait]
impl EmailDelivery for AcceptingEmail {
    async fn deliver(&self, _email: &InviteEmail) -> Result<(), NetworkError> {
        Ok(())
    }
}

/// A running server bound to an ephemeral port.
#[derive(Debug)]
pub struct TestApp {
    /// Bound address.
    pub addr: SocketAddr,
    /// Backing store, for seeding players.
    pub store: Arc<MemoryStore>,
    /// HTTP client.
    pub client: reqwest::Client,
}

impl TestApp {
    /// Absolute URL for an `/api/v1` path.
    pub fn api(&self, path: &str) -> String {
        format!("http://{}/api/v1{path}", self.addr)
    }

    /// Absolute URL for a root-level path.
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    /// WebSocket endpoint URL.
    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    /// Inserts a player directly into the store.
    pub async fn player(&self, alias: &str, role: PlayerRole) -> Player {
        let Ok(player) = self
            .store
            .insert_player(NewPlayer {
                auth_user_id: AuthUserId::new(),
                alias: alias.to_string(),
                role,
            })
            .await
        else {
            panic!("seeding {alias} failed");
        };
        player
    }

    /// `GET` returning status and JSON body.
    pub async fn get_json(&self, url: &str) -> (reqwest::StatusCode, Value) {
        let Ok(resp) = self.client.get(url).send().await else {
            panic!("GET {url} failed");
        };
        let status = resp.status();
        let Ok(body) = resp.json::<Value>().await else {
            panic!("GET {url} returned non-JSON");
        };
        (status, body)
    }

    /// `POST` a JSON body returning status and JSON body.
    pub async fn post_json(&self, url: &str, body: &Value) -> (reqwest::StatusCode, Value) {
        let Ok(resp) = self.client.post(url).json(body).send().await else {
            panic!("POST {url} failed");
        };
        let status = resp.status();
        let Ok(body) = resp.json::<Value>().await else {
            panic!("POST {url} returned non-JSON");
        };
        (status, body)
    }
}

/// Starts the app over a fresh in-memory store with the fetch throttle
/// disabled, so every mutation is immediately visible.
pub async fn spawn_app() -> TestApp {
    spawn_app_with(NetworkConfig {
        network_throttle: Duration::ZERO,
        ..NetworkConfig::default()
    })
    .await
}

/// Starts the app with an explicit configuration.
pub async fn spawn_app_with(config: NetworkConfig) -> TestApp {
    let store = Arc::new(MemoryStore::new());
    let shared: Arc<dyn NetworkStore> = Arc::<MemoryStore>::clone(&store);
    let state = AppState::new(shared, Arc::new(AcceptingEmail), &config);
    let app = api::build_app(state, config.request_timeout);

    let Ok(listener) = TcpListener::bind("127.0.0.1:0").await else {
        panic!("bind failed");
    };
    let Ok(addr) = listener.local_addr() else {
        panic!("no local addr");
    };
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    TestApp {
        addr,
        store,
        client: reqwest::Client::new(),
    }
}

/// Minimal WebSocket client speaking the envelope protocol.
#[derive(Debug)]
pub struct WsClient {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl WsClient {
    /// Connects to `url`.
    pub async fn connect(url: &str) -> Self {
        let Ok((stream, _)) = connect_async(url).await else {
            panic!("ws connect to {url} failed");
        };
        Self { stream }
    }

    /// Sends a command envelope.
    pub async fn command(&mut self, id: &str, payload: Value) {
        let envelope = serde_json::json!({
            "id": id,
            "type": "command",
            "timestamp": chrono::Utc::now(),
            "payload": payload,
        });
        if self
            .stream
            .send(Message::text(envelope.to_string()))
            .await
            .is_err()
        {
            panic!("ws send failed");
        }
    }

    /// Next text frame as JSON, or `None` on timeout or close.
    pub async fn recv_json(&mut self, timeout: Duration) -> Option<Value> {
        loop {
            let next = tokio::time::timeout(timeout, self.stream.next()).await.ok()??;
            match next.ok()? {
                Message::Text(text) => return serde_json::from_str(text.as_str()).ok(),
                Message::Close(_) => return None,
                _ => {}
            }
        }
    }
}
