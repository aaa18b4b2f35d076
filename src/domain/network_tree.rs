//! Derived network tree and the aggregated network result.
//!
//! The tree is a non-owning projection rebuilt on every aggregation. Its
//! shape is fixed:
//!
//! ```text
//! sponsor
//!  └── root ("You")
//!       ├── left        (invite slot)
//!       ├── downline 1
//!       ├── ...
//!       ├── downline N
//!       └── right       (invite slot)
//! ```

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::{PlayerSummary, RelationshipId};

/// Node id of the sponsor node.
pub const SPONSOR_NODE_ID: &str = "sponsor";
/// Node id of the current player's node.
pub const ROOT_NODE_ID: &str = "root";
/// Node id of the leading invite slot.
pub const LEFT_INVITE_NODE_ID: &str = "left";
/// Node id of the trailing invite slot.
pub const RIGHT_INVITE_NODE_ID: &str = "right";

/// Sponsor label while a sponsor request awaits a decision.
pub const IN_REVIEW_LABEL: &str = "In Review";
/// Sponsor label when the player has neither a sponsor nor a request.
pub const REQUEST_SPONSOR_LABEL: &str = "Request a Sponsor";
/// Label of the current player's node.
pub const ROOT_LABEL: &str = "You";
/// Label of both invite slots.
pub const INVITE_LABEL: &str = "Invite";

/// One node of the derived network tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[schema(no_recursion)]
pub struct NetworkNode {
    /// Node id. Fixed ids for structural nodes, the player id for
    /// downline nodes.
    pub id: String,
    /// Display label.
    pub alias: String,
    /// Child nodes in render order.
    pub children: Vec<NetworkNode>,
}

impl NetworkNode {
    fn leaf(id: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            alias: alias.into(),
            children: Vec::new(),
        }
    }

    /// Returns the root ("You") node below the sponsor node, if present.
    #[must_use]
    pub fn root(&self) -> Option<&NetworkNode> {
        self.children.iter().find(|c| c.id == ROOT_NODE_ID)
    }
}

/// An incoming sponsor request awaiting the current player's decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct PendingDownline {
    /// Relationship to accept or decline.
    pub relationship_id: RelationshipId,
    /// Requesting player.
    pub player: PlayerSummary,
    /// When the request was made.
    pub requested_at: DateTime<Utc>,
}

/// Where the current player stands with respect to a sponsor.
///
/// Derived once per fetch so the sponsor label and `has_pending_request`
/// can never disagree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SponsorState {
    /// No upline relationship at all.
    None,
    /// A sponsor request is pending.
    Requested(RelationshipId),
    /// An active sponsor exists.
    Active(PlayerSummary),
}

impl SponsorState {
    /// Label shown on the sponsor node.
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::None => REQUEST_SPONSOR_LABEL.to_string(),
            Self::Requested(_) => IN_REVIEW_LABEL.to_string(),
            Self::Active(sponsor) => sponsor.alias.clone(),
        }
    }
}

/// Builds the fixed-shape tree for the given sponsor state and active
/// downlines.
#[must_use]
pub fn shape_network(sponsor: &SponsorState, downlines: &[PlayerSummary]) -> NetworkNode {
    let mut children = Vec::with_capacity(downlines.len().saturating_add(2));
    children.push(NetworkNode::leaf(LEFT_INVITE_NODE_ID, INVITE_LABEL));
    children.extend(
        downlines
            .iter()
            .map(|d| NetworkNode::leaf(d.id.to_string(), d.alias.clone())),
    );
    children.push(NetworkNode::leaf(RIGHT_INVITE_NODE_ID, INVITE_LABEL));

    let root = NetworkNode {
        id: ROOT_NODE_ID.to_string(),
        alias: ROOT_LABEL.to_string(),
        children,
    };

    NetworkNode {
        id: SPONSOR_NODE_ID.to_string(),
        alias: sponsor.label(),
        children: vec![root],
    }
}

/// Render-ready result of one network aggregation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct AggregatedNetwork {
    /// The player the network was built for.
    pub player: PlayerSummary,
    /// Fixed-shape tree.
    pub network: NetworkNode,
    /// Admins a sponsor request may be addressed to.
    pub admin_profiles: Vec<PlayerSummary>,
    /// The player's active sponsor, if any.
    pub active_sponsor: Option<PlayerSummary>,
    /// Players this player actively sponsors.
    pub downlines: Vec<PlayerSummary>,
    /// Incoming sponsor requests awaiting this player's decision.
    pub pending_downlines: Vec<PendingDownline>,
    /// Whether this player's own sponsor request is pending.
    pub has_pending_request: bool,
    /// The pending sponsor request, if any.
    pub pending_request_id: Option<RelationshipId>,
    /// Secondary lookups that failed during this aggregation.
    pub degraded: Vec<String>,
}

impl AggregatedNetwork {
    /// Assembles the result from one fetch snapshot.
    #[must_use]
    pub fn assemble(
        player: PlayerSummary,
        sponsor: SponsorState,
        downlines: Vec<PlayerSummary>,
        pending_downlines: Vec<PendingDownline>,
        admin_profiles: Vec<PlayerSummary>,
        degraded: Vec<String>,
    ) -> Self {
        let network = shape_network(&sponsor, &downlines);
        let (has_pending_request, pending_request_id, active_sponsor) = match sponsor {
            SponsorState::None => (false, None, None),
            SponsorState::Requested(id) => (true, Some(id), None),
            SponsorState::Active(s) => (false, None, Some(s)),
        };
        Self {
            player,
            network,
            admin_profiles,
            active_sponsor,
            downlines,
            pending_downlines,
            has_pending_request,
            pending_request_id,
            degraded,
        }
    }

    /// Label currently shown on the sponsor node.
    #[must_use]
    pub fn sponsor_label(&self) -> &str {
        &self.network.alias
    }
}
