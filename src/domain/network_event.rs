//! Domain events reflecting relationship and invite mutations.
//!
//! Every successful mutation emits a [`NetworkEvent`] through the
//! [`super::EventBus`]. WebSocket subscribers use them as the signal to
//! re-request their network.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{InviteId, InviteStatus, PlayerId, RelationshipId};

/// Domain event emitted after every relationship or invite mutation.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum NetworkEvent {
    /// A downline asked an upline to sponsor them.
    RelationshipRequested {
        /// New pending relationship.
        relationship_id: RelationshipId,
        /// Requested sponsor.
        upline_id: PlayerId,
        /// Requesting player.
        downline_id: PlayerId,
        /// Event timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A pending relationship became active.
    RelationshipAccepted {
        /// Activated relationship.
        relationship_id: RelationshipId,
        /// Sponsor.
        upline_id: PlayerId,
        /// Sponsored player.
        downline_id: PlayerId,
        /// Event timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A pending relationship was declined or cancelled.
    RelationshipRemoved {
        /// Deleted relationship.
        relationship_id: RelationshipId,
        /// Requested sponsor.
        upline_id: PlayerId,
        /// Requesting player.
        downline_id: PlayerId,
        /// Event timestamp.
        timestamp: DateTime<Utc>,
    },

    /// An invite row was created.
    InviteCreated {
        /// New invite.
        invite_id: InviteId,
        /// Sending player.
        inviter_id: PlayerId,
        /// Status after the delivery attempt.
        status: InviteStatus,
        /// Event timestamp.
        timestamp: DateTime<Utc>,
    },

    /// An invite changed status.
    InviteStatusChanged {
        /// Affected invite.
        invite_id: InviteId,
        /// Sending player.
        inviter_id: PlayerId,
        /// Previous status.
        from: InviteStatus,
        /// New status.
        to: InviteStatus,
        /// Event timestamp.
        timestamp: DateTime<Utc>,
    },
}

impl NetworkEvent {
    /// Returns `true` if `player` is affected by this event and should
    /// refresh its network.
    #[must_use]
    pub fn involves(&self, player: PlayerId) -> bool {
        match self {
            Self::RelationshipRequested {
                upline_id,
                downline_id,
                ..
            }
            | Self::RelationshipAccepted {
                upline_id,
                downline_id,
                ..
            }
            | Self::RelationshipRemoved {
                upline_id,
                downline_id,
                ..
            } => *upline_id == player || *downline_id == player,
            Self::InviteCreated { inviter_id, .. } | Self::InviteStatusChanged { inviter_id, .. } => {
                *inviter_id == player
            }
        }
    }

    /// Returns the event type as a static string slice.
    #[must_use]
    pub const fn event_type_str(&self) -> &'static str {
        match self {
            Self::RelationshipRequested { .. } => "relationship_requested",
            Self::RelationshipAccepted { .. } => "relationship_accepted",
            Self::RelationshipRemoved { .. } => "relationship_removed",
            Self::InviteCreated { .. } => "invite_created",
            Self::InviteStatusChanged { .. } => "invite_status_changed",
        }
    }
}
