//! Directed sponsor/downline edges between players.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{PlayerId, RelationshipId};

/// Relationship kind written when a player asks an admin to sponsor them.
pub const SPONSOR_REQUEST_KIND: &str = "requested sponsor of";

/// Relationship kind written when a player joins through an invite.
pub const INVITE_ACCEPTED_KIND: &str = "invited";

/// Lifecycle of a relationship row.
///
/// A row is created `Pending`, becomes `Active` when the upline accepts,
/// and is deleted (not transitioned) on decline or cancel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipStatus {
    /// Awaiting the upline's decision.
    Pending,
    /// Accepted; the upline is the downline's active sponsor.
    Active,
}

impl RelationshipStatus {
    /// Returns the stored string form.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Active => "active",
        }
    }
}

impl fmt::Display for RelationshipStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RelationshipStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "active" => Ok(Self::Active),
            other => Err(format!("unknown relationship status: {other}")),
        }
    }
}

/// A directed edge: `upline_id` sponsors `downline_id`.
///
/// A downline has at most one relationship row as downline at any time,
/// whatever its status. The store rejects a second one with a conflict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Relationship {
    /// Primary key.
    pub id: RelationshipId,
    /// Sponsoring player.
    pub upline_id: PlayerId,
    /// Sponsored player.
    pub downline_id: PlayerId,
    /// Current status.
    pub status: RelationshipStatus,
    /// Free-text label, e.g. [`SPONSOR_REQUEST_KIND`].
    pub kind: String,
    /// Row creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Timestamp of the last status change.
    pub updated_at: DateTime<Utc>,
}

impl Relationship {
    /// Returns `true` if `player` is either end of this edge.
    #[must_use]
    pub fn involves(&self, player: PlayerId) -> bool {
        self.upline_id == player || self.downline_id == player
    }
}
