//! Database row models for players, relationships, and invites.
//!
//! Enum columns are stored as `TEXT` guarded by `CHECK` constraints and
//! parsed into their domain types on the way out.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::domain::{Invite, Player, Relationship};
use crate::error::NetworkError;

/// A row of the `players` table.
#[derive(Debug, Clone, FromRow)]
pub struct PlayerRow {
    /// Primary key.
    pub id: Uuid,
    /// External auth identity.
    pub auth_user_id: Uuid,
    /// Display alias.
    pub alias: String,
    /// `player` or `admin`.
    pub role: String,
    /// Signup timestamp.
    pub created_at: DateTime<Utc>,
}

impl TryFrom<PlayerRow> for Player {
    type Error = NetworkError;

    fn try_from(row: PlayerRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id.into(),
            auth_user_id: row.auth_user_id.into(),
            alias: row.alias,
            role: row.role.parse().map_err(NetworkError::PersistenceError)?,
            created_at: row.created_at,
        })
    }
}

/// A row of the `relationships` table.
#[derive(Debug, Clone, FromRow)]
pub struct RelationshipRow {
    /// Primary key.
    pub id: Uuid,
    /// Sponsoring player.
    pub upline_id: Uuid,
    /// Sponsored player.
    pub downline_id: Uuid,
    /// `pending` or `active`.
    pub status: String,
    /// Free-text label.
    pub kind: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last status change.
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<RelationshipRow> for Relationship {
    type Error = NetworkError;

    fn try_from(row: RelationshipRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id.into(),
            upline_id: row.upline_id.into(),
            downline_id: row.downline_id.into(),
            status: row.status.parse().map_err(NetworkError::PersistenceError)?,
            kind: row.kind,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// A row of the `invites` table.
#[derive(Debug, Clone, FromRow)]
pub struct InviteRow {
    /// Primary key.
    pub id: Uuid,
    /// Sending player.
    pub inviter_id: Uuid,
    /// Recipient email.
    pub email: String,
    /// Recipient first name.
    pub first_name: String,
    /// Recipient last name.
    pub last_name: String,
    /// Invite status string.
    pub status: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last status change.
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<InviteRow> for Invite {
    type Error = NetworkError;

    fn try_from(row: InviteRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id.into(),
            inviter_id: row.inviter_id.into(),
            email: row.email,
            first_name: row.first_name,
            last_name: row.last_name,
            status: row.status.parse().map_err(NetworkError::PersistenceError)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
