//! # tabletop-network
//!
//! REST API and WebSocket service for a tabletop community's player
//! network: who sponsors whom, pending sponsor requests, and email invites
//! sent to prospective players.
//!
//! Each player sees a fixed-shape tree: their sponsor (or a placeholder)
//! on top, themselves below it, and up to two invite slots flanking their
//! direct downlines. The tree is aggregated from the store, cached per
//! auth identity, and re-fetched after every mutation the player makes.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP, WebSocket)
//!     │
//!     ├── REST Handlers (api/)
//!     ├── WS Handler (ws/)
//!     │
//!     ├── NetworkService / RelationshipService / InviteService (service/)
//!     ├── NetworkCache (service/)
//!     ├── EventBus (domain/)
//!     │
//!     ├── Tree renderer (render/)
//!     │
//!     └── NetworkStore: PostgreSQL or in-memory (persistence/)
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod render;
pub mod service;
pub mod ws;
