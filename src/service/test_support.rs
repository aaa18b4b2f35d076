//! Store and email doubles shared by the service tests.

#![allow(clippy::panic)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::email::{EmailDelivery, InviteEmail};
use crate::domain::{
    AuthUserId, Invite, InviteId, InviteStatus, NewInvite, NewPlayer, Player, PlayerId,
    PlayerRole, Relationship, RelationshipId, RelationshipStatus,
};
use crate::error::NetworkError;
use crate::persistence::{MemoryStore, NetworkStore, NewRelationship};

/// [`MemoryStore`] wrapper that counts primary lookups and can fail
/// selected queries on demand.
#[derive(Debug, Default)]
pub(crate) struct FaultStore {
    pub inner: MemoryStore,
    pub auth_lookups: AtomicUsize,
    pub fail_auth_lookup: AtomicBool,
    pub fail_admin_profiles: AtomicBool,
    pub fail_downlines: AtomicBool,
    pub fail_find_player: AtomicBool,
    pub fail_invite_status: AtomicBool,
}

impl FaultStore {
    pub fn lookups(&self) -> usize {
        self.auth_lookups.load(Ordering::SeqCst)
    }

    pub async fn player(&self, alias: &str, role: PlayerRole) -> Player {
        let Ok(player) = self
            .inner
            .insert_player(NewPlayer {
                auth_user_id: AuthUserId::new(),
                alias: alias.to_string(),
                role,
            })
            .await
        else {
            panic!("seed player insert failed");
        };
        player
    }

    pub async fn relate(
        &self,
        upline: &Player,
        downline: &Player,
        status: RelationshipStatus,
    ) -> Relationship {
        let Ok(rel) = self
            .inner
            .insert_relationship(NewRelationship {
                upline_id: upline.id,
                downline_id: downline.id,
                status,
                kind: "seeded".to_string(),
            })
            .await
        else {
            panic!("seed relationship insert failed");
        };
        rel
    }
}

fn injected(what: &str) -> NetworkError {
    NetworkError::PersistenceError(format!("injected {what} failure"))
}

#[async_trait]
impl NetworkStore for FaultStore {
    async fn insert_player(&self, new: NewPlayer) -> Result<Player, NetworkError> {
        self.inner.insert_player(new).await
    }

    async fn find_player_by_auth(&self, auth: AuthUserId) -> Result<Option<Player>, NetworkError> {
        self.auth_lookups.fetch_add(1, Ordering::SeqCst);
        if self.fail_auth_lookup.load(Ordering::SeqCst) {
            return Err(injected("player"));
        }
        self.inner.find_player_by_auth(auth).await
    }

    async fn find_player(&self, id: PlayerId) -> Result<Option<Player>, NetworkError> {
        if self.fail_find_player.load(Ordering::SeqCst) {
            return Err(injected("player by id"));
        }
        self.inner.find_player(id).await
    }

    async fn find_players(&self, ids: &[PlayerId]) -> Result<Vec<Player>, NetworkError> {
        self.inner.find_players(ids).await
    }

    async fn list_admin_profiles(&self) -> Result<Vec<Player>, NetworkError> {
        if self.fail_admin_profiles.load(Ordering::SeqCst) {
            return Err(injected("admin profiles"));
        }
        self.inner.list_admin_profiles().await
    }

    async fn find_upline_relationship(
        &self,
        downline: PlayerId,
        status: RelationshipStatus,
    ) -> Result<Option<Relationship>, NetworkError> {
        self.inner.find_upline_relationship(downline, status).await
    }

    async fn list_downline_relationships(
        &self,
        upline: PlayerId,
        status: RelationshipStatus,
    ) -> Result<Vec<Relationship>, NetworkError> {
        if self.fail_downlines.load(Ordering::SeqCst) {
            return Err(injected("downlines"));
        }
        self.inner.list_downline_relationships(upline, status).await
    }

    async fn get_relationship(
        &self,
        id: RelationshipId,
    ) -> Result<Option<Relationship>, NetworkError> {
        self.inner.get_relationship(id).await
    }

    async fn insert_relationship(
        &self,
        new: NewRelationship,
    ) -> Result<Relationship, NetworkError> {
        self.inner.insert_relationship(new).await
    }

    async fn activate_relationship(
        &self,
        id: RelationshipId,
    ) -> Result<Relationship, NetworkError> {
        self.inner.activate_relationship(id).await
    }

    async fn delete_pending_relationship(
        &self,
        id: RelationshipId,
    ) -> Result<Relationship, NetworkError> {
        self.inner.delete_pending_relationship(id).await
    }

    async fn insert_invite(&self, new: NewInvite) -> Result<Invite, NetworkError> {
        self.inner.insert_invite(new).await
    }

    async fn get_invite(&self, id: InviteId) -> Result<Option<Invite>, NetworkError> {
        self.inner.get_invite(id).await
    }

    async fn update_invite_status(
        &self,
        id: InviteId,
        from: InviteStatus,
        to: InviteStatus,
    ) -> Result<Invite, NetworkError> {
        if self.fail_invite_status.load(Ordering::SeqCst) {
            return Err(injected("invite status"));
        }
        self.inner.update_invite_status(id, from, to).await
    }

    async fn accept_invite(
        &self,
        id: InviteId,
        downline: PlayerId,
    ) -> Result<(Invite, Relationship), NetworkError> {
        self.inner.accept_invite(id, downline).await
    }
}

/// Email double that records every message and fails while `failing` is
/// set.
#[derive(Debug, Default)]
pub(crate) struct RecordingEmail {
    pub sent: Mutex<Vec<InviteEmail>>,
    pub failing: AtomicBool,
}

impl RecordingEmail {
    pub fn failing() -> Arc<Self> {
        let email = Self::default();
        email.failing.store(true, Ordering::SeqCst);
        Arc::new(email)
    }
}

#[async_trait]
impl EmailDelivery for RecordingEmail {
    async fn deliver(&self, email: &InviteEmail) -> Result<(), NetworkError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(NetworkError::EmailDelivery("smtp relay down".to_string()));
        }
        self.sent.lock().await.push(email.clone());
        Ok(())
    }
}
