//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::config::NetworkConfig;
use crate::domain::EventBus;
use crate::persistence::NetworkStore;
use crate::service::{
    EmailDelivery, InviteService, NetworkCache, NetworkService, RelationshipService,
};

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Network aggregation and cache.
    pub network_service: NetworkService,
    /// Sponsor requests and decisions.
    pub relationship_service: RelationshipService,
    /// Invite delivery and lifecycle.
    pub invite_service: InviteService,
    /// Event bus for WebSocket subscriptions.
    pub event_bus: EventBus,
}

impl AppState {
    /// Wires the services around an already-constructed store and email
    /// client.
    #[must_use]
    pub fn new(
        store: Arc<dyn NetworkStore>,
        email: Arc<dyn EmailDelivery>,
        config: &NetworkConfig,
    ) -> Self {
        let event_bus = EventBus::new(config.event_bus_capacity);
        let cache = Arc::new(NetworkCache::new(
            config.network_cache_ttl,
            config.network_throttle,
        ));
        let network_service = NetworkService::new(Arc::clone(&store), cache);
        let relationship_service = RelationshipService::new(
            Arc::clone(&store),
            network_service.clone(),
            event_bus.clone(),
        );
        let invite_service =
            InviteService::new(store, email, network_service.clone(), event_bus.clone());

        Self {
            network_service,
            relationship_service,
            invite_service,
            event_bus,
        }
    }
}
