//! Service layer: business logic orchestration.
//!
//! [`NetworkService`] aggregates and caches each player's network.
//! [`RelationshipService`] and [`InviteService`] perform the mutations,
//! emit events through the [`super::domain::EventBus`], and ask the
//! aggregator to refetch the players they touched.

pub mod email;
pub mod invite_service;
pub mod network_cache;
pub mod network_service;
pub mod relationship_service;

#[cfg(test)]
mod test_support;

pub use email::{DisabledEmailDelivery, EmailDelivery, HttpEmailDelivery, InviteEmail};
pub use invite_service::{DeliveredInvite, InviteRecipient, InviteService};
pub use network_cache::NetworkCache;
pub use network_service::{NetworkFetch, NetworkService};
pub use relationship_service::RelationshipService;
