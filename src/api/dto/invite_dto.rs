//! Invite DTOs for send, resend, status tracking, and accept.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::RelationshipDto;
use crate::domain::{AuthUserId, Invite, InviteId, InviteStatus, PlayerId};
use crate::service::{DeliveredInvite, InviteRecipient};

/// Request body for `POST /players/{user_id}/invites`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SendInviteRequest {
    /// Recipient email address.
    pub email: String,
    /// Recipient first name.
    pub first_name: String,
    /// Recipient last name.
    pub last_name: String,
}

impl From<SendInviteRequest> for InviteRecipient {
    fn from(req: SendInviteRequest) -> Self {
        Self {
            email: req.email,
            first_name: req.first_name,
            last_name: req.last_name,
        }
    }
}

/// An invite as returned by the API.
#[derive(Debug, Serialize, ToSchema)]
pub struct InviteDto {
    /// Invite identifier.
    pub invite_id: InviteId,
    /// Sending player.
    pub inviter_id: PlayerId,
    /// Recipient email address.
    pub email: String,
    /// Recipient first name.
    pub first_name: String,
    /// Recipient last name.
    pub last_name: String,
    /// Current status.
    pub status: InviteStatus,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last status change.
    pub updated_at: DateTime<Utc>,
}

impl From<Invite> for InviteDto {
    fn from(invite: Invite) -> Self {
        Self {
            invite_id: invite.id,
            inviter_id: invite.inviter_id,
            email: invite.email,
            first_name: invite.first_name,
            last_name: invite.last_name,
            status: invite.status,
            created_at: invite.created_at,
            updated_at: invite.updated_at,
        }
    }
}

/// Response body for send and resend.
#[derive(Debug, Serialize, ToSchema)]
pub struct SendInviteResponse {
    /// The stored invite.
    pub invite: InviteDto,
    /// `false` when the email function failed; the invite is then
    /// `email_failed` and can be resent.
    pub email_delivered: bool,
}

impl From<DeliveredInvite> for SendInviteResponse {
    fn from(delivered: DeliveredInvite) -> Self {
        Self {
            invite: delivered.invite.into(),
            email_delivered: delivered.email_delivered,
        }
    }
}

/// Request body for `POST /invites/{id}/status`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct InviteStatusRequest {
    /// New status: `read`, `clicked`, or `declined`.
    pub status: InviteStatus,
}

/// Request body for `POST /invites/{id}/accept`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AcceptInviteRequest {
    /// Auth identity of the accepting player.
    pub user_id: AuthUserId,
}

/// Response body for `POST /invites/{id}/accept`.
#[derive(Debug, Serialize, ToSchema)]
pub struct AcceptInviteResponse {
    /// The accepted invite.
    pub invite: InviteDto,
    /// The active relationship inviter → accepting player.
    pub relationship: RelationshipDto,
}
