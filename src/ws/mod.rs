//! WebSocket layer: connection handling, message routing, subscriptions.
//!
//! The WebSocket endpoint at `/ws` pushes [`crate::domain::NetworkEvent`]s
//! to clients following the affected players, and answers `get_network`
//! commands with the same view the REST endpoint returns.

pub mod connection;
pub mod handler;
pub mod messages;
pub mod subscription;
