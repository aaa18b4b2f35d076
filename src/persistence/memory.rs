//! In-process store with the same invariants as the PostgreSQL schema.
//!
//! All tables live in one [`MemoryTables`] value behind a single
//! [`tokio::sync::RwLock`], so every trait method runs under one lock scope
//! and multi-row transitions are atomic.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{NetworkStore, NewRelationship};
use crate::domain::relationship::INVITE_ACCEPTED_KIND;
use crate::domain::{
    AuthUserId, Invite, InviteId, InviteStatus, NewInvite, NewPlayer, Player, PlayerId,
    PlayerRole, Relationship, RelationshipId, RelationshipStatus,
};
use crate::error::NetworkError;

#[derive(Debug, Default)]
struct MemoryTables {
    players: HashMap<PlayerId, Player>,
    relationships: HashMap<RelationshipId, Relationship>,
    invites: HashMap<InviteId, Invite>,
}

impl MemoryTables {
    fn upline_of(&self, downline: PlayerId) -> Option<&Relationship> {
        self.relationships
            .values()
            .find(|r| r.downline_id == downline)
    }

    fn insert_relationship(&mut self, new: NewRelationship) -> Result<Relationship, NetworkError> {
        if new.upline_id == new.downline_id {
            return Err(NetworkError::InvalidRequest(
                "a player cannot sponsor themself".to_string(),
            ));
        }
        for id in [new.upline_id, new.downline_id] {
            if !self.players.contains_key(&id) {
                return Err(NetworkError::PlayerNotFound(*id.as_uuid()));
            }
        }
        if let Some(existing) = self.upline_of(new.downline_id) {
            return Err(NetworkError::Conflict(format!(
                "player {} already has a {} upline relationship",
                new.downline_id, existing.status
            )));
        }
        let now = Utc::now();
        let rel = Relationship {
            id: RelationshipId::new(),
            upline_id: new.upline_id,
            downline_id: new.downline_id,
            status: new.status,
            kind: new.kind,
            created_at: now,
            updated_at: now,
        };
        self.relationships.insert(rel.id, rel.clone());
        Ok(rel)
    }
}

/// [`NetworkStore`] kept entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<MemoryTables>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl NetworkStore for MemoryStore {
    async fn insert_player(&self, new: NewPlayer) -> Result<Player, NetworkError> {
        let mut tables = self.tables.write().await;
        if tables
            .players
            .values()
            .any(|p| p.auth_user_id == new.auth_user_id)
        {
            return Err(NetworkError::Conflict(format!(
                "auth user {} already has a profile",
                new.auth_user_id
            )));
        }
        let player = Player {
            id: PlayerId::new(),
            auth_user_id: new.auth_user_id,
            alias: new.alias,
            role: new.role,
            created_at: Utc::now(),
        };
        tables.players.insert(player.id, player.clone());
        Ok(player)
    }

    async fn find_player_by_auth(&self, auth: AuthUserId) -> Result<Option<Player>, NetworkError> {
        let tables = self.tables.read().await;
        Ok(tables
            .players
            .values()
            .find(|p| p.auth_user_id == auth)
            .cloned())
    }

    async fn find_player(&self, id: PlayerId) -> Result<Option<Player>, NetworkError> {
        Ok(self.tables.read().await.players.get(&id).cloned())
    }

    async fn find_players(&self, ids: &[PlayerId]) -> Result<Vec<Player>, NetworkError> {
        let tables = self.tables.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| tables.players.get(id).cloned())
            .collect())
    }

    async fn list_admin_profiles(&self) -> Result<Vec<Player>, NetworkError> {
        let tables = self.tables.read().await;
        let mut admins: Vec<Player> = tables
            .players
            .values()
            .filter(|p| p.role == PlayerRole::Admin)
            .cloned()
            .collect();
        admins.sort_by(|a, b| a.alias.cmp(&b.alias));
        Ok(admins)
    }

    async fn find_upline_relationship(
        &self,
        downline: PlayerId,
        status: RelationshipStatus,
    ) -> Result<Option<Relationship>, NetworkError> {
        let tables = self.tables.read().await;
        Ok(tables
            .upline_of(downline)
            .filter(|r| r.status == status)
            .cloned())
    }

    async fn list_downline_relationships(
        &self,
        upline: PlayerId,
        status: RelationshipStatus,
    ) -> Result<Vec<Relationship>, NetworkError> {
        let tables = self.tables.read().await;
        let mut rels: Vec<Relationship> = tables
            .relationships
            .values()
            .filter(|r| r.upline_id == upline && r.status == status)
            .cloned()
            .collect();
        rels.sort_by_key(|r| r.created_at);
        Ok(rels)
    }

    async fn get_relationship(
        &self,
        id: RelationshipId,
    ) -> Result<Option<Relationship>, NetworkError> {
        Ok(self.tables.read().await.relationships.get(&id).cloned())
    }

    async fn insert_relationship(
        &self,
        new: NewRelationship,
    ) -> Result<Relationship, NetworkError> {
        self.tables.write().await.insert_relationship(new)
    }

    async fn activate_relationship(
        &self,
        id: RelationshipId,
    ) -> Result<Relationship, NetworkError> {
        let mut tables = self.tables.write().await;
        let rel = tables
            .relationships
            .get_mut(&id)
            .ok_or(NetworkError::RelationshipNotFound(*id.as_uuid()))?;
        if rel.status != RelationshipStatus::Pending {
            return Err(NetworkError::Conflict(format!(
                "relationship {id} is already {}",
                rel.status
            )));
        }
        rel.status = RelationshipStatus::Active;
        rel.updated_at = Utc::now();
        Ok(rel.clone())
    }

    async fn delete_pending_relationship(
        &self,
        id: RelationshipId,
    ) -> Result<Relationship, NetworkError> {
        let mut tables = self.tables.write().await;
        let status = tables
            .relationships
            .get(&id)
            .map(|r| r.status)
            .ok_or(NetworkError::RelationshipNotFound(*id.as_uuid()))?;
        if status != RelationshipStatus::Pending {
            return Err(NetworkError::Conflict(format!(
                "relationship {id} is already {status}"
            )));
        }
        tables
            .relationships
            .remove(&id)
            .ok_or(NetworkError::RelationshipNotFound(*id.as_uuid()))
    }

    async fn insert_invite(&self, new: NewInvite) -> Result<Invite, NetworkError> {
        let mut tables = self.tables.write().await;
        if !tables.players.contains_key(&new.inviter_id) {
            return Err(NetworkError::PlayerNotFound(*new.inviter_id.as_uuid()));
        }
        let now = Utc::now();
        let invite = Invite {
            id: InviteId::new(),
            inviter_id: new.inviter_id,
            email: new.email,
            first_name: new.first_name,
            last_name: new.last_name,
            status: InviteStatus::Unsent,
            created_at: now,
            updated_at: now,
        };
        tables.invites.insert(invite.id, invite.clone());
        Ok(invite)
    }

    async fn get_invite(&self, id: InviteId) -> Result<Option<Invite>, NetworkError> {
        Ok(self.tables.read().await.invites.get(&id).cloned())
    }

    async fn update_invite_status(
        &self,
        id: InviteId,
        from: InviteStatus,
        to: InviteStatus,
    ) -> Result<Invite, NetworkError> {
        let mut tables = self.tables.write().await;
        let invite = tables
            .invites
            .get_mut(&id)
            .ok_or(NetworkError::InviteNotFound(*id.as_uuid()))?;
        if invite.status != from {
            return Err(NetworkError::Conflict(format!(
                "invite {id} is {} not {from}",
                invite.status
            )));
        }
        invite.status = to;
        invite.updated_at = Utc::now();
        Ok(invite.clone())
    }

    async fn accept_invite(
        &self,
        id: InviteId,
        downline: PlayerId,
    ) -> Result<(Invite, Relationship), NetworkError> {
        let mut tables = self.tables.write().await;
        let invite = tables
            .invites
            .get(&id)
            .cloned()
            .ok_or(NetworkError::InviteNotFound(*id.as_uuid()))?;
        if !invite.status.can_transition_to(InviteStatus::Accepted) {
            return Err(NetworkError::InvalidTransition {
                from: invite.status,
                to: InviteStatus::Accepted,
            });
        }

        // Insert first: a conflict here must leave the invite untouched.
        let rel = tables.insert_relationship(NewRelationship {
            upline_id: invite.inviter_id,
            downline_id: downline,
            status: RelationshipStatus::Active,
            kind: INVITE_ACCEPTED_KIND.to_string(),
        })?;

        let accepted = Invite {
            status: InviteStatus::Accepted,
            updated_at: Utc::now(),
            ..invite
        };
        tables.invites.insert(accepted.id, accepted.clone());
        Ok((accepted, rel))
    }
}
