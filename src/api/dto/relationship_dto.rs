//! Sponsor request and relationship DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{PlayerId, Relationship, RelationshipId, RelationshipStatus};

/// Request body for `POST /players/{user_id}/sponsor-requests`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SponsorRequestBody {
    /// Admin profile asked to sponsor the player.
    pub admin_profile_id: PlayerId,
}

/// A relationship row as returned by the API.
#[derive(Debug, Serialize, ToSchema)]
pub struct RelationshipDto {
    /// Relationship identifier.
    pub relationship_id: RelationshipId,
    /// Sponsor.
    pub upline_id: PlayerId,
    /// Sponsored player.
    pub downline_id: PlayerId,
    /// `pending` or `active`.
    pub status: RelationshipStatus,
    /// Free-text label.
    pub kind: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last status change.
    pub updated_at: DateTime<Utc>,
}

impl From<Relationship> for RelationshipDto {
    fn from(rel: Relationship) -> Self {
        Self {
            relationship_id: rel.id,
            upline_id: rel.upline_id,
            downline_id: rel.downline_id,
            status: rel.status,
            kind: rel.kind,
            created_at: rel.created_at,
            updated_at: rel.updated_at,
        }
    }
}
