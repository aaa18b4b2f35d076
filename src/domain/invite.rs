//! Player invites and their delivery/response state machine.
//!
//! ```text
//! unsent ──► sent ──► read ──► clicked ──► accepted
//!   │         │  │       │  │        │
//!   │         │  └───────┴──┴────────┴───► declined
//!   ▼         │
//! email_failed◄── (delivery failure on resend)
//! ```
//!
//! `accepted` and `declined` are terminal. A resend is an explicit action
//! that moves any non-terminal delivered state (or `email_failed`) back to
//! `sent`.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{InviteId, PlayerId};

/// Status of an invite row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum InviteStatus {
    /// Row created, email not yet attempted.
    Unsent,
    /// Email handed to the delivery function.
    Sent,
    /// Recipient opened the email.
    Read,
    /// Recipient followed the invite link.
    Clicked,
    /// Recipient joined; a relationship now exists.
    Accepted,
    /// Recipient turned the invite down.
    Declined,
    /// The delivery function reported a failure.
    EmailFailed,
}

impl InviteStatus {
    /// Returns the stored string form.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Unsent => "unsent",
            Self::Sent => "sent",
            Self::Read => "read",
            Self::Clicked => "clicked",
            Self::Accepted => "accepted",
            Self::Declined => "declined",
            Self::EmailFailed => "email_failed",
        }
    }

    /// Returns `true` for states with no outgoing transition.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Accepted | Self::Declined)
    }

    /// Returns `true` if a delivery attempt (initial send or resend) may
    /// start from this state.
    #[must_use]
    pub const fn can_deliver(&self) -> bool {
        matches!(
            self,
            Self::Unsent | Self::Sent | Self::Read | Self::Clicked | Self::EmailFailed
        )
    }

    /// Returns `true` if a recipient-driven transition from `self` to
    /// `next` is allowed.
    ///
    /// Delivery outcomes (`sent`, `email_failed`) are not recipient-driven
    /// and are checked by [`Self::can_deliver`] instead.
    #[must_use]
    pub const fn can_transition_to(&self, next: Self) -> bool {
        match (self, next) {
            (Self::Sent, Self::Read | Self::Clicked | Self::Accepted | Self::Declined)
            | (Self::Read, Self::Clicked | Self::Accepted | Self::Declined)
            | (Self::Clicked, Self::Accepted | Self::Declined) => true,
            _ => false,
        }
    }
}

impl fmt::Display for InviteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InviteStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unsent" => Ok(Self::Unsent),
            "sent" => Ok(Self::Sent),
            "read" => Ok(Self::Read),
            "clicked" => Ok(Self::Clicked),
            "accepted" => Ok(Self::Accepted),
            "declined" => Ok(Self::Declined),
            "email_failed" => Ok(Self::EmailFailed),
            other => Err(format!("unknown invite status: {other}")),
        }
    }
}

/// A recruitment invite sent by a player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Invite {
    /// Primary key.
    pub id: InviteId,
    /// Player who sent the invite and becomes the upline on acceptance.
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
    /// Timestamp of the last status change.
    pub updated_at: DateTime<Utc>,
}

/// Fields supplied when an invite is created. New invites always start
/// as [`InviteStatus::Unsent`].
#[derive(Debug, Clone)]
pub struct NewInvite {
    /// Sending player.
    pub inviter_id: PlayerId,
    /// Recipient email address.
    pub email: String,
    /// Recipient first name.
    pub first_name: String,
    /// Recipient last name.
    pub last_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [InviteStatus; 7] = [
        InviteStatus::Unsent,
        InviteStatus::Sent,
        InviteStatus::Read,
        InviteStatus::Clicked,
        InviteStatus::Accepted,
        InviteStatus::Declined,
        InviteStatus::EmailFailed,
    ];

    #[test]
    fn terminal_states_have_no_exits() {
        for from in [InviteStatus::Accepted, InviteStatus::Declined] {
            assert!(from.is_terminal());
            assert!(!from.can_deliver());
            for to in ALL {
                assert!(!from.can_transition_to(to), "{from} -> {to}");
            }
        }
    }

    #[test]
    fn unsent_only_moves_by_delivery() {
        for to in ALL {
            assert!(!InviteStatus::Unsent.can_transition_to(to));
        }
        assert!(InviteStatus::Unsent.can_deliver());
    }

    #[test]
    fn email_failed_can_only_be_resent() {
        for to in ALL {
            assert!(!InviteStatus::EmailFailed.can_transition_to(to));
        }
        assert!(InviteStatus::EmailFailed.can_deliver());
    }

    #[test]
    fn sent_invites_progress_forward_only() {
        assert!(InviteStatus::Sent.can_transition_to(InviteStatus::Read));
        assert!(InviteStatus::Read.can_transition_to(InviteStatus::Clicked));
        assert!(InviteStatus::Clicked.can_transition_to(InviteStatus::Accepted));
        assert!(!InviteStatus::Clicked.can_transition_to(InviteStatus::Read));
        assert!(!InviteStatus::Read.can_transition_to(InviteStatus::Sent));
    }

    #[test]
    fn stored_form_parses_back() {
        for status in ALL {
            assert_eq!(status.as_str().parse::<InviteStatus>(), Ok(status));
        }
    }
}
