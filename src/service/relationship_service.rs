//! Sponsor requests and the upline's accept/decline decision.

use std::sync::Arc;

use chrono::Utc;

use super::NetworkService;
use crate::domain::relationship::SPONSOR_REQUEST_KIND;
use crate::domain::{
    AuthUserId, EventBus, NetworkEvent, Player, PlayerId, Relationship, RelationshipId,
    RelationshipStatus,
};
use crate::error::NetworkError;
use crate::persistence::{NetworkStore, NewRelationship};

/// Creates, resolves and withdraws relationship rows.
///
/// Every successful mutation publishes a [`NetworkEvent`] and asks the
/// aggregator to refetch both players involved. Results are never patched
/// into the cached view.
#[derive(Debug, Clone)]
pub struct RelationshipService {
    store: Arc<dyn NetworkStore>,
    network: NetworkService,
    event_bus: EventBus,
}

impl RelationshipService {
    /// Creates a new `RelationshipService`.
    #[must_use]
    pub fn new(store: Arc<dyn NetworkStore>, network: NetworkService, event_bus: EventBus) -> Self {
        Self {
            store,
            network,
            event_bus,
        }
    }

    /// Asks `admin_profile_id` to sponsor the player behind `user`.
    ///
    /// # Errors
    ///
    /// [`NetworkError::ProfileNotFound`] / [`NetworkError::PlayerNotFound`]
    /// for unknown players, [`NetworkError::InvalidRequest`] if the target
    /// is the player themself or not an admin, and
    /// [`NetworkError::Conflict`] if the player already has an upline.
    pub async fn request_sponsor(
        &self,
        user: AuthUserId,
        admin_profile_id: PlayerId,
    ) -> Result<Relationship, NetworkError> {
        let player = self.player_for(user).await?;
        if player.id == admin_profile_id {
            return Err(NetworkError::InvalidRequest(
                "a player cannot sponsor themself".to_string(),
            ));
        }
        let admin = self
            .store
            .find_player(admin_profile_id)
            .await?
            .ok_or(NetworkError::PlayerNotFound(*admin_profile_id.as_uuid()))?;
        if !admin.is_admin() {
            return Err(NetworkError::InvalidRequest(format!(
                "player {} is not an admin profile",
                admin.id
            )));
        }

        let rel = self
            .store
            .insert_relationship(NewRelationship {
                upline_id: admin.id,
                downline_id: player.id,
                status: RelationshipStatus::Pending,
                kind: SPONSOR_REQUEST_KIND.to_string(),
            })
            .await?;

        let _ = self.event_bus.publish(NetworkEvent::RelationshipRequested {
            relationship_id: rel.id,
            upline_id: rel.upline_id,
            downline_id: rel.downline_id,
            timestamp: Utc::now(),
        });
        tracing::info!(
            relationship = %rel.id,
            upline = %admin.id,
            downline = %player.id,
            "sponsor requested"
        );

        self.refresh(user, Some(admin.auth_user_id)).await;
        Ok(rel)
    }

    /// Withdraws the player's pending sponsor request.
    ///
    /// # Errors
    ///
    /// [`NetworkError::ProfileNotFound`] for an unknown user and
    /// [`NetworkError::Conflict`] if no request is pending.
    pub async fn cancel_sponsor_request(
        &self,
        user: AuthUserId,
    ) -> Result<Relationship, NetworkError> {
        let player = self.player_for(user).await?;
        let pending = self
            .store
            .find_upline_relationship(player.id, RelationshipStatus::Pending)
            .await?
            .ok_or_else(|| NetworkError::Conflict("no pending sponsor request".to_string()))?;

        let rel = self.store.delete_pending_relationship(pending.id).await?;
        self.publish_removed(&rel);
        tracing::info!(relationship = %rel.id, downline = %player.id, "sponsor request cancelled");

        let upline = self.auth_of(rel.upline_id).await;
        self.refresh(user, upline).await;
        Ok(rel)
    }

    /// Accepts a pending request addressed to the player behind `user`.
    ///
    /// # Errors
    ///
    /// [`NetworkError::RelationshipNotFound`] if the row is gone,
    /// [`NetworkError::Forbidden`] if the player is not its upline, and
    /// [`NetworkError::Conflict`] if it is no longer pending.
    pub async fn accept_downline(
        &self,
        user: AuthUserId,
        relationship_id: RelationshipId,
    ) -> Result<Relationship, NetworkError> {
        let player = self.player_for(user).await?;
        self.owned_by(&player, relationship_id).await?;

        let rel = self.store.activate_relationship(relationship_id).await?;
        let _ = self.event_bus.publish(NetworkEvent::RelationshipAccepted {
            relationship_id: rel.id,
            upline_id: rel.upline_id,
            downline_id: rel.downline_id,
            timestamp: Utc::now(),
        });
        tracing::info!(
            relationship = %rel.id,
            upline = %player.id,
            downline = %rel.downline_id,
            "downline accepted"
        );

        let downline = self.auth_of(rel.downline_id).await;
        self.refresh(user, downline).await;
        Ok(rel)
    }

    /// Declines a pending request addressed to the player behind `user`.
    /// The row is deleted.
    ///
    /// # Errors
    ///
    /// Same as [`Self::accept_downline`].
    pub async fn decline_downline(
        &self,
        user: AuthUserId,
        relationship_id: RelationshipId,
    ) -> Result<Relationship, NetworkError> {
        let player = self.player_for(user).await?;
        self.owned_by(&player, relationship_id).await?;

        let rel = self.store.delete_pending_relationship(relationship_id).await?;
        self.publish_removed(&rel);
        tracing::info!(
            relationship = %rel.id,
            upline = %player.id,
            downline = %rel.downline_id,
            "downline declined"
        );

        let downline = self.auth_of(rel.downline_id).await;
        self.refresh(user, downline).await;
        Ok(rel)
    }

    async fn player_for(&self, user: AuthUserId) -> Result<Player, NetworkError> {
        self.store
            .find_player_by_auth(user)
            .await?
            .ok_or(NetworkError::ProfileNotFound(*user.as_uuid()))
    }

    async fn owned_by(&self, upline: &Player, id: RelationshipId) -> Result<(), NetworkError> {
        let rel = self
            .store
            .get_relationship(id)
            .await?
            .ok_or(NetworkError::RelationshipNotFound(*id.as_uuid()))?;
        if rel.upline_id != upline.id {
            return Err(NetworkError::Forbidden(format!(
                "player {} is not the upline of relationship {id}",
                upline.id
            )));
        }
        Ok(())
    }

    /// Resolves the other party of a committed mutation. A failure here
    /// only narrows the refetch to the actor.
    async fn auth_of(&self, id: PlayerId) -> Option<AuthUserId> {
        match self.store.find_player(id).await {
            Ok(player) => player.map(|p| p.auth_user_id),
            Err(err) => {
                tracing::warn!(
                    player = %id,
                    error = %err,
                    "counterpart lookup failed, refreshing actor only"
                );
                None
            }
        }
    }

    fn publish_removed(&self, rel: &Relationship) {
        let _ = self.event_bus.publish(NetworkEvent::RelationshipRemoved {
            relationship_id: rel.id,
            upline_id: rel.upline_id,
            downline_id: rel.downline_id,
            timestamp: Utc::now(),
        });
    }

    async fn refresh(&self, actor: AuthUserId, other: Option<AuthUserId>) {
        self.network
            .refetch_all(std::iter::once(actor).chain(other))
            .await;
    }
}
