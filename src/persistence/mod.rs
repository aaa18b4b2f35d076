//! Persistence layer: the relationship store.
//!
//! [`NetworkStore`] is the seam between the services and the backing
//! database. [`postgres::PostgresStore`] is the production implementation
//! on `sqlx::PgPool`; [`memory::MemoryStore`] keeps the same semantics in
//! process for tests and local runs.
//!
//! Every multi-row transition (activating a relationship, accepting an
//! invite) is a single store call so implementations can make it atomic.

pub mod memory;
pub mod models;
pub mod postgres;

use std::fmt;

use async_trait::async_trait;

use crate::domain::{
    AuthUserId, Invite, InviteId, InviteStatus, NewInvite, NewPlayer, Player, PlayerId,
    Relationship, RelationshipId, RelationshipStatus,
};
use crate::error::NetworkError;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

/// Fields supplied when a relationship row is created.
#[derive(Debug, Clone)]
pub struct NewRelationship {
    /// Sponsoring player.
    pub upline_id: PlayerId,
    /// Sponsored player.
    pub downline_id: PlayerId,
    /// Initial status.
    pub status: RelationshipStatus,
    /// Free-text label.
    pub kind: String,
}

/// Query/insert/update/delete access to players, relationships and
/// invites.
///
/// Implementations enforce that a player appears as downline in at most
/// one relationship row, and report violations as
/// [`NetworkError::Conflict`].
#[async_trait]
pub trait NetworkStore: Send + Sync + fmt::Debug {
    /// Creates a player record.
    ///
    /// # Errors
    ///
    /// [`NetworkError::Conflict`] if the auth identity is already linked.
    async fn insert_player(&self, new: NewPlayer) -> Result<Player, NetworkError>;

    /// Looks up the player linked to an auth identity.
    ///
    /// # Errors
    ///
    /// Returns a [`NetworkError::PersistenceError`] on database failure.
    async fn find_player_by_auth(&self, auth: AuthUserId) -> Result<Option<Player>, NetworkError>;

    /// Looks up a player by id.
    ///
    /// # Errors
    ///
    /// Returns a [`NetworkError::PersistenceError`] on database failure.
    async fn find_player(&self, id: PlayerId) -> Result<Option<Player>, NetworkError>;

    /// Looks up several players by id. Missing ids are skipped; the
    /// result follows the order of `ids`.
    ///
    /// # Errors
    ///
    /// Returns a [`NetworkError::PersistenceError`] on database failure.
    async fn find_players(&self, ids: &[PlayerId]) -> Result<Vec<Player>, NetworkError>;

    /// Lists players with the admin role, ordered by alias.
    ///
    /// # Errors
    ///
    /// Returns a [`NetworkError::PersistenceError`] on database failure.
    async fn list_admin_profiles(&self) -> Result<Vec<Player>, NetworkError>;

    /// Returns the relationship in which `downline` is the downline, if
    /// it has the given status.
    ///
    /// # Errors
    ///
    /// Returns a [`NetworkError::PersistenceError`] on database failure.
    async fn find_upline_relationship(
        &self,
        downline: PlayerId,
        status: RelationshipStatus,
    ) -> Result<Option<Relationship>, NetworkError>;

    /// Lists relationships with the given status in which `upline` is the
    /// upline, oldest first.
    ///
    /// # Errors
    ///
    /// Returns a [`NetworkError::PersistenceError`] on database failure.
    async fn list_downline_relationships(
        &self,
        upline: PlayerId,
        status: RelationshipStatus,
    ) -> Result<Vec<Relationship>, NetworkError>;

    /// Looks up a relationship by id.
    ///
    /// # Errors
    ///
    /// Returns a [`NetworkError::PersistenceError`] on database failure.
    async fn get_relationship(
        &self,
        id: RelationshipId,
    ) -> Result<Option<Relationship>, NetworkError>;

    /// Creates a relationship row.
    ///
    /// # Errors
    ///
    /// [`NetworkError::Conflict`] if the downline already has an upline
    /// relationship, [`NetworkError::InvalidRequest`] if both ends are the
    /// same player.
    async fn insert_relationship(
        &self,
        new: NewRelationship,
    ) -> Result<Relationship, NetworkError>;

    /// Moves a pending relationship to active.
    ///
    /// # Errors
    ///
    /// [`NetworkError::RelationshipNotFound`] if the row is gone,
    /// [`NetworkError::Conflict`] if it is no longer pending.
    async fn activate_relationship(
        &self,
        id: RelationshipId,
    ) -> Result<Relationship, NetworkError>;

    /// Deletes a pending relationship, returning the deleted row.
    ///
    /// # Errors
    ///
    /// [`NetworkError::RelationshipNotFound`] if the row is gone,
    /// [`NetworkError::Conflict`] if it is already active.
    async fn delete_pending_relationship(
        &self,
        id: RelationshipId,
    ) -> Result<Relationship, NetworkError>;

    /// Creates an invite with status [`InviteStatus::Unsent`].
    ///
    /// # Errors
    ///
    /// Returns a [`NetworkError::PersistenceError`] on database failure.
    async fn insert_invite(&self, new: NewInvite) -> Result<Invite, NetworkError>;

    /// Looks up an invite by id.
    ///
    /// # Errors
    ///
    /// Returns a [`NetworkError::PersistenceError`] on database failure.
    async fn get_invite(&self, id: InviteId) -> Result<Option<Invite>, NetworkError>;

    /// Sets an invite's status if it is still `from`.
    ///
    /// # Errors
    ///
    /// [`NetworkError::InviteNotFound`] if the row is gone,
    /// [`NetworkError::Conflict`] if its status is no longer `from`.
    async fn update_invite_status(
        &self,
        id: InviteId,
        from: InviteStatus,
        to: InviteStatus,
    ) -> Result<Invite, NetworkError>;

    /// Marks an invite accepted and creates the active relationship from
    /// the inviter to `downline`, atomically.
    ///
    /// # Errors
    ///
    /// [`NetworkError::InviteNotFound`], [`NetworkError::InvalidTransition`]
    /// if the invite cannot be accepted from its current status, and
    /// [`NetworkError::Conflict`] if `downline` already has an upline. On
    /// error nothing is written.
    async fn accept_invite(
        &self,
        id: InviteId,
        downline: PlayerId,
    ) -> Result<(Invite, Relationship), NetworkError>;
}
