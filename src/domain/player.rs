//! Player records and the lightweight summaries shown in the network view.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{AuthUserId, PlayerId};

/// Role column of the player table. Admins are the players a sponsor
/// request may be addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PlayerRole {
    /// Regular community member.
    Player,
    /// Organizer able to sponsor other players.
    Admin,
}

impl PlayerRole {
    /// Returns the stored string form.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Player => "player",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for PlayerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlayerRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "player" => Ok(Self::Player),
            "admin" => Ok(Self::Admin),
            other => Err(format!("unknown player role: {other}")),
        }
    }
}

/// A player identity record. Created at signup, mutated by profile edits,
/// never hard-deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Player {
    /// Primary key.
    pub id: PlayerId,
    /// Link to the external auth identity.
    pub auth_user_id: AuthUserId,
    /// Display alias.
    pub alias: String,
    /// Role used for sponsor selection.
    pub role: PlayerRole,
    /// Signup timestamp.
    pub created_at: DateTime<Utc>,
}

impl Player {
    /// Returns `true` if this player may receive sponsor requests.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == PlayerRole::Admin
    }

    /// Returns the id/alias pair used in network views.
    #[must_use]
    pub fn summary(&self) -> PlayerSummary {
        PlayerSummary {
            id: self.id,
            alias: self.alias.clone(),
        }
    }
}

/// Fields supplied when a player record is created.
#[derive(Debug, Clone)]
pub struct NewPlayer {
    /// External auth identity.
    pub auth_user_id: AuthUserId,
    /// Display alias.
    pub alias: String,
    /// Initial role.
    pub role: PlayerRole,
}

/// Id and alias of a player, as embedded in network responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PlayerSummary {
    /// Player identifier.
    pub id: PlayerId,
    /// Display alias.
    pub alias: String,
}
