//! Network aggregation: one fetch, one snapshot, one cached result.
//!
//! [`NetworkService::get_network`] answers from the [`NetworkCache`] when
//! it can, honours the throttle window when the cache is stale, and
//! otherwise reads the player's relationships from the store and shapes
//! them into an [`AggregatedNetwork`].
//!
//! Only the primary lookup (the player behind the auth identity) aborts an
//! aggregation. Every other lookup degrades to an empty section, logged
//! and named in [`AggregatedNetwork::degraded`].

use std::collections::HashMap;
use std::sync::Arc;

use tokio::time::Instant;

use super::network_cache::NetworkCache;
use crate::domain::{
    AggregatedNetwork, AuthUserId, PendingDownline, Player, PlayerSummary, RelationshipStatus,
    SponsorState,
};
use crate::error::NetworkError;
use crate::persistence::NetworkStore;

/// Outcome of one aggregation request.
#[derive(Debug, Clone)]
pub enum NetworkFetch {
    /// No auth identity yet; nothing was read.
    NotReady,
    /// No player profile is linked to the auth identity.
    ProfileNotFound,
    /// Served from cache without touching the store.
    Cached(Arc<AggregatedNetwork>),
    /// Freshly aggregated and cached.
    Fresh(Arc<AggregatedNetwork>),
    /// Skipped because the previous fetch is too recent. Carries the last
    /// cached value, if any.
    Throttled(Option<Arc<AggregatedNetwork>>),
}

impl NetworkFetch {
    /// The aggregated network carried by this outcome, if any.
    #[must_use]
    pub fn network(&self) -> Option<&Arc<AggregatedNetwork>> {
        match self {
            Self::Cached(n) | Self::Fresh(n) | Self::Throttled(Some(n)) => Some(n),
            Self::NotReady | Self::ProfileNotFound | Self::Throttled(None) => None,
        }
    }

    /// Short machine-readable name of the outcome.
    #[must_use]
    pub const fn source(&self) -> &'static str {
        match self {
            Self::NotReady => "not_ready",
            Self::ProfileNotFound => "profile_not_found",
            Self::Cached(_) => "cached",
            Self::Fresh(_) => "fresh",
            Self::Throttled(_) => "throttled",
        }
    }
}

/// Builds and caches per-player network views.
#[derive(Debug, Clone)]
pub struct NetworkService {
    store: Arc<dyn NetworkStore>,
    cache: Arc<NetworkCache>,
}

impl NetworkService {
    /// Creates a service over `store` using `cache` for results.
    #[must_use]
    pub fn new(store: Arc<dyn NetworkStore>, cache: Arc<NetworkCache>) -> Self {
        Self { store, cache }
    }

    /// Returns the injected cache.
    #[must_use]
    pub fn cache(&self) -> &Arc<NetworkCache> {
        &self.cache
    }

    /// Returns the aggregated network for `user`.
    ///
    /// # Errors
    ///
    /// Returns a [`NetworkError`] only if the primary player lookup fails.
    pub async fn get_network(
        &self,
        user: Option<AuthUserId>,
    ) -> Result<NetworkFetch, NetworkError> {
        let Some(user) = user else {
            return Ok(NetworkFetch::NotReady);
        };
        self.fetch(user, false).await
    }

    /// Drops the cached value for `user` and aggregates again, still
    /// subject to the throttle window.
    ///
    /// # Errors
    ///
    /// Returns a [`NetworkError`] only if the primary player lookup fails.
    pub async fn refetch(&self, user: AuthUserId) -> Result<NetworkFetch, NetworkError> {
        self.fetch(user, true).await
    }

    /// Refetches every player touched by a mutation. Outcomes and failures
    /// are logged, not returned.
    pub async fn refetch_all(&self, users: impl IntoIterator<Item = AuthUserId>) {
        for user in users {
            match self.refetch(user).await {
                Ok(outcome) => {
                    tracing::debug!(%user, source = outcome.source(), "network refetched");
                }
                Err(err) => tracing::warn!(%user, error = %err, "network refetch failed"),
            }
        }
    }

    /// Marks `user`'s cached value stale so the next read fetches again
    /// once the throttle window allows it.
    pub async fn invalidate(&self, user: AuthUserId) {
        self.cache.invalidate(user).await;
    }

    /// Drops all cache state for `user`.
    pub async fn evict(&self, user: AuthUserId) {
        self.cache.evict(user).await;
    }

    async fn fetch(&self, user: AuthUserId, bypass: bool) -> Result<NetworkFetch, NetworkError> {
        let handle = self.cache.slot(user).await;
        let mut slot = handle.lock().await;
        let now = Instant::now();

        if bypass {
            slot.invalidate();
        } else if let Some(value) = slot.fresh(now) {
            tracing::trace!(%user, "network served from cache");
            return Ok(NetworkFetch::Cached(value));
        }

        if slot.is_throttled(now, self.cache.throttle()) {
            tracing::debug!(%user, "network fetch throttled");
            return Ok(NetworkFetch::Throttled(slot.last_value()));
        }

        slot.begin_fetch(now);
        let Some(network) = self.aggregate(user).await? else {
            tracing::info!(%user, "no player profile for auth user");
            slot.abandon_fetch();
            drop(slot);
            drop(handle);
            self.cache.evict(user).await;
            return Ok(NetworkFetch::ProfileNotFound);
        };

        let network = Arc::new(network);
        slot.store(Arc::clone(&network), Instant::now(), self.cache.ttl());
        tracing::debug!(
            %user,
            downlines = network.downlines.len(),
            pending = network.has_pending_request,
            degraded = network.degraded.len(),
            "network aggregated"
        );
        Ok(NetworkFetch::Fresh(network))
    }

    async fn aggregate(&self, user: AuthUserId) -> Result<Option<AggregatedNetwork>, NetworkError> {
        let Some(player) = self.store.find_player_by_auth(user).await? else {
            return Ok(None);
        };
        let mut degraded = Degraded::default();

        let sponsor = self.sponsor_state(&player, &mut degraded).await;
        let downlines = self.active_downlines(&player, &mut degraded).await;
        let pending_downlines = self.pending_downlines(&player, &mut degraded).await;
        let admin_profiles = degraded
            .settle("admin_profiles", self.store.list_admin_profiles().await)
            .unwrap_or_default()
            .into_iter()
            .filter(|admin| admin.id != player.id)
            .map(|admin| admin.summary())
            .collect();

        Ok(Some(AggregatedNetwork::assemble(
            player.summary(),
            sponsor,
            downlines,
            pending_downlines,
            admin_profiles,
            degraded.0,
        )))
    }

    async fn sponsor_state(&self, player: &Player, degraded: &mut Degraded) -> SponsorState {
        let pending = degraded
            .settle(
                "pending_request",
                self.store
                    .find_upline_relationship(player.id, RelationshipStatus::Pending)
                    .await,
            )
            .flatten();
        if let Some(request) = pending {
            return SponsorState::Requested(request.id);
        }

        let active = degraded
            .settle(
                "active_sponsor",
                self.store
                    .find_upline_relationship(player.id, RelationshipStatus::Active)
                    .await,
            )
            .flatten();
        let Some(active) = active else {
            return SponsorState::None;
        };

        match degraded
            .settle("active_sponsor", self.store.find_player(active.upline_id).await)
            .flatten()
        {
            Some(sponsor) => SponsorState::Active(sponsor.summary()),
            None => {
                tracing::warn!(
                    player = %player.id,
                    upline = %active.upline_id,
                    "active sponsor row points at a missing player"
                );
                SponsorState::None
            }
        }
    }

    async fn active_downlines(
        &self,
        player: &Player,
        degraded: &mut Degraded,
    ) -> Vec<PlayerSummary> {
        let relationships = degraded
            .settle(
                "downlines",
                self.store
                    .list_downline_relationships(player.id, RelationshipStatus::Active)
                    .await,
            )
            .unwrap_or_default();
        let ids: Vec<_> = relationships.iter().map(|r| r.downline_id).collect();
        if ids.is_empty() {
            return Vec::new();
        }
        degraded
            .settle("downlines", self.store.find_players(&ids).await)
            .unwrap_or_default()
            .iter()
            .map(Player::summary)
            .collect()
    }

    async fn pending_downlines(
        &self,
        player: &Player,
        degraded: &mut Degraded,
    ) -> Vec<PendingDownline> {
        let relationships = degraded
            .settle(
                "pending_downlines",
                self.store
                    .list_downline_relationships(player.id, RelationshipStatus::Pending)
                    .await,
            )
            .unwrap_or_default();
        let ids: Vec<_> = relationships.iter().map(|r| r.downline_id).collect();
        if ids.is_empty() {
            return Vec::new();
        }
        let players: HashMap<_, _> = degraded
            .settle("pending_downlines", self.store.find_players(&ids).await)
            .unwrap_or_default()
            .into_iter()
            .map(|p| (p.id, p.summary()))
            .collect();

        relationships
            .into_iter()
            .filter_map(|r| {
                players.get(&r.downline_id).map(|summary| PendingDownline {
                    relationship_id: r.id,
                    player: summary.clone(),
                    requested_at: r.created_at,
                })
            })
            .collect()
    }
}

/// Names of secondary lookups that failed during one aggregation.
#[derive(Debug, Default)]
struct Degraded(Vec<String>);

impl Degraded {
    fn settle<T>(&mut self, section: &'static str, result: Result<T, NetworkError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::warn!(section, error = %err, "secondary network lookup failed");
                if !self.0.iter().any(|s| s == section) {
                    self.0.push(section.to_string());
                }
                None
            }
        }
    }
}
