//! Invite creation, delivery and the recipient-driven status machine.
//!
//! A failed delivery never fails the call: the invite is kept, marked
//! [`InviteStatus::EmailFailed`], and returned with
//! `email_delivered = false` so the caller can offer a resend.

use std::sync::Arc;

use chrono::Utc;

use super::NetworkService;
use super::email::{EmailDelivery, InviteEmail};
use crate::domain::{
    AuthUserId, EventBus, Invite, InviteId, InviteStatus, NetworkEvent, NewInvite, Player,
    Relationship,
};
use crate::error::NetworkError;
use crate::persistence::NetworkStore;

/// Recipient details for a new invite.
#[derive(Debug, Clone)]
pub struct InviteRecipient {
    /// Recipient email address.
    pub email: String,
    /// Recipient first name.
    pub first_name: String,
    /// Recipient last name.
    pub last_name: String,
}

impl InviteRecipient {
    fn validated(self) -> Result<Self, NetworkError> {
        let email = self.email.trim().to_string();
        let first_name = self.first_name.trim().to_string();
        let last_name = self.last_name.trim().to_string();

        let well_formed = email
            .split_once('@')
            .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
        if !well_formed {
            return Err(NetworkError::InvalidRequest(format!(
                "invalid email address: {email:?}"
            )));
        }
        if first_name.is_empty() || last_name.is_empty() {
            return Err(NetworkError::InvalidRequest(
                "first and last name are required".to_string(),
            ));
        }
        Ok(Self {
            email,
            first_name,
            last_name,
        })
    }
}

/// An invite after a delivery attempt.
#[derive(Debug, Clone)]
pub struct DeliveredInvite {
    /// The stored invite.
    pub invite: Invite,
    /// Whether the email function accepted the message.
    pub email_delivered: bool,
}

/// Sends invites and tracks their lifecycle.
#[derive(Debug, Clone)]
pub struct InviteService {
    store: Arc<dyn NetworkStore>,
    email: Arc<dyn EmailDelivery>,
    network: NetworkService,
    event_bus: EventBus,
}

impl InviteService {
    /// Creates a new `InviteService`.
    #[must_use]
    pub fn new(
        store: Arc<dyn NetworkStore>,
        email: Arc<dyn EmailDelivery>,
        network: NetworkService,
        event_bus: EventBus,
    ) -> Self {
        Self {
            store,
            email,
            network,
            event_bus,
        }
    }

    /// Creates an invite from the player behind `user` and emails it.
    ///
    /// # Errors
    ///
    /// [`NetworkError::InvalidRequest`] for a malformed recipient and
    /// [`NetworkError::ProfileNotFound`] for an unknown user. Delivery
    /// failure is not an error.
    pub async fn send_invite(
        &self,
        user: AuthUserId,
        recipient: InviteRecipient,
    ) -> Result<DeliveredInvite, NetworkError> {
        let recipient = recipient.validated()?;
        let inviter = self.player_for(user).await?;

        let invite = self
            .store
            .insert_invite(NewInvite {
                inviter_id: inviter.id,
                email: recipient.email,
                first_name: recipient.first_name,
                last_name: recipient.last_name,
            })
            .await?;
        tracing::info!(invite = %invite.id, inviter = %inviter.id, "invite created");

        let delivered = self.deliver(invite).await;
        let _ = self.event_bus.publish(NetworkEvent::InviteCreated {
            invite_id: delivered.invite.id,
            inviter_id: delivered.invite.inviter_id,
            status: delivered.invite.status,
            timestamp: Utc::now(),
        });
        Ok(delivered)
    }

    /// Emails an existing invite again.
    ///
    /// # Errors
    ///
    /// [`NetworkError::InviteNotFound`] and
    /// [`NetworkError::InvalidTransition`] once the invite was accepted or
    /// declined.
    pub async fn resend_invite(&self, id: InviteId) -> Result<DeliveredInvite, NetworkError> {
        let invite = self.invite(id).await?;
        if !invite.status.can_deliver() {
            return Err(NetworkError::InvalidTransition {
                from: invite.status,
                to: InviteStatus::Sent,
            });
        }
        let from = invite.status;
        let delivered = self.deliver(invite).await;
        self.publish_status(&delivered.invite, from);
        Ok(delivered)
    }

    /// Records a recipient-driven status change (read, clicked, declined).
    ///
    /// # Errors
    ///
    /// [`NetworkError::InvalidRequest`] for `accepted`, which goes through
    /// [`Self::accept_invite`], and [`NetworkError::InvalidTransition`] for
    /// any move the state machine does not allow.
    pub async fn record_invite_status(
        &self,
        id: InviteId,
        status: InviteStatus,
    ) -> Result<Invite, NetworkError> {
        if status == InviteStatus::Accepted {
            return Err(NetworkError::InvalidRequest(
                "accepting an invite requires the accepting player".to_string(),
            ));
        }
        let invite = self.invite(id).await?;
        if !invite.status.can_transition_to(status) {
            return Err(NetworkError::InvalidTransition {
                from: invite.status,
                to: status,
            });
        }

        let updated = self
            .store
            .update_invite_status(id, invite.status, status)
            .await?;
        self.publish_status(&updated, invite.status);
        tracing::info!(invite = %id, from = %invite.status, to = %status, "invite status recorded");
        Ok(updated)
    }

    /// Accepts an invite on behalf of the player behind `user`: the invite
    /// becomes `accepted` and the inviter becomes the player's active
    /// sponsor, in one store transaction.
    ///
    /// # Errors
    ///
    /// [`NetworkError::InviteNotFound`], [`NetworkError::InvalidTransition`]
    /// if the invite is not awaiting a response, and
    /// [`NetworkError::Conflict`] if the player already has an upline.
    pub async fn accept_invite(
        &self,
        id: InviteId,
        user: AuthUserId,
    ) -> Result<(Invite, Relationship), NetworkError> {
        let player = self.player_for(user).await?;
        let before = self.invite(id).await?;

        let (invite, rel) = self.store.accept_invite(id, player.id).await?;
        self.publish_status(&invite, before.status);
        let _ = self.event_bus.publish(NetworkEvent::RelationshipAccepted {
            relationship_id: rel.id,
            upline_id: rel.upline_id,
            downline_id: rel.downline_id,
            timestamp: Utc::now(),
        });
        tracing::info!(invite = %id, upline = %rel.upline_id, downline = %player.id, "invite accepted");

        let inviter = match self.store.find_player(rel.upline_id).await {
            Ok(inviter) => inviter.map(|p| p.auth_user_id),
            Err(err) => {
                tracing::warn!(
                    player = %rel.upline_id,
                    error = %err,
                    "inviter lookup failed, refreshing accepting player only"
                );
                None
            }
        };
        self.network
            .refetch_all(std::iter::once(user).chain(inviter))
            .await;
        Ok((invite, rel))
    }

    /// Emails `invite` and records the outcome. The invite already exists,
    /// so a failed status write is logged and the invite is returned with
    /// its previous status.
    async fn deliver(&self, invite: Invite) -> DeliveredInvite {
        let email = InviteEmail {
            to: invite.email.clone(),
            first_name: invite.first_name.clone(),
            last_name: invite.last_name.clone(),
        };
        let (next, email_delivered) = match self.email.deliver(&email).await {
            Ok(()) => (InviteStatus::Sent, true),
            Err(err) => {
                tracing::warn!(invite = %invite.id, error = %err, "invite email failed");
                (InviteStatus::EmailFailed, false)
            }
        };
        let invite = match self
            .store
            .update_invite_status(invite.id, invite.status, next)
            .await
        {
            Ok(updated) => updated,
            Err(err) => {
                tracing::warn!(
                    invite = %invite.id,
                    status = %next,
                    error = %err,
                    "invite status write failed after delivery attempt"
                );
                invite
            }
        };
        DeliveredInvite {
            invite,
            email_delivered,
        }
    }

    fn publish_status(&self, invite: &Invite, from: InviteStatus) {
        if invite.status == from {
            return;
        }
        let _ = self.event_bus.publish(NetworkEvent::InviteStatusChanged {
            invite_id: invite.id,
            inviter_id: invite.inviter_id,
            from,
            to: invite.status,
            timestamp: Utc::now(),
        });
    }

    async fn player_for(&self, user: AuthUserId) -> Result<Player, NetworkError> {
        self.store
            .find_player_by_auth(user)
            .await?
            .ok_or(NetworkError::ProfileNotFound(*user.as_uuid()))
    }

    async fn invite(&self, id: InviteId) -> Result<Invite, NetworkError> {
        self.store
            .get_invite(id)
            .await?
            .ok_or(NetworkError::InviteNotFound(*id.as_uuid()))
    }
}
