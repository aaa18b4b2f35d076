//! Presentation model for the network tree.
//!
//! [`render_tree`] maps each [`NetworkNode`] to a [`NodeView`] by node id:
//! the sponsor node, the root ("You") node, the two invite slots, and
//! downline players for every other id. Connector flags tell a client
//! which lines to draw: a vertical connector below any node with children,
//! and a horizontal bar across siblings when there is more than one child.

use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::network_tree::{
    LEFT_INVITE_NODE_ID, RIGHT_INVITE_NODE_ID, ROOT_NODE_ID, SPONSOR_NODE_ID,
};
use crate::domain::{
    AggregatedNetwork, NetworkNode, PendingDownline, PlayerId, PlayerSummary, RelationshipId,
};

/// Data the node renderers need besides the tree itself.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    /// Current sponsor, if active.
    pub active_sponsor: Option<&'a PlayerSummary>,
    /// Admins that can be asked to sponsor.
    pub admin_profiles: &'a [PlayerSummary],
    /// The player's own pending request, if any.
    pub pending_request_id: Option<RelationshipId>,
    /// Incoming requests awaiting the player's decision.
    pub pending_downlines: &'a [PendingDownline],
}

impl<'a> RenderContext<'a> {
    /// Borrows everything from one aggregation result.
    #[must_use]
    pub fn from_network(network: &'a AggregatedNetwork) -> Self {
        Self {
            active_sponsor: network.active_sponsor.as_ref(),
            admin_profiles: &network.admin_profiles,
            pending_request_id: network.pending_request_id,
            pending_downlines: &network.pending_downlines,
        }
    }
}

/// Which invite slot a node is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum InviteSide {
    /// Leading slot.
    Left,
    /// Trailing slot.
    Right,
}

/// A user action offered on a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum NodeAction {
    /// Ask this admin to become the sponsor.
    RequestSponsor {
        /// Target admin profile.
        admin_profile_id: PlayerId,
        /// Admin alias for the selector.
        alias: String,
    },
    /// Withdraw the pending sponsor request.
    CancelSponsorRequest {
        /// Pending relationship.
        relationship_id: RelationshipId,
    },
    /// Accept an incoming sponsor request.
    AcceptDownline {
        /// Pending relationship.
        relationship_id: RelationshipId,
        /// Requesting player.
        player: PlayerSummary,
    },
    /// Decline an incoming sponsor request.
    DeclineDownline {
        /// Pending relationship.
        relationship_id: RelationshipId,
        /// Requesting player.
        player: PlayerSummary,
    },
    /// Open the invite form.
    SendInvite,
}

/// Node-kind specific content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeBody {
    /// The sponsor node.
    Sponsor {
        /// "In Review", "Request a Sponsor", or the sponsor's alias.
        label: String,
        /// Active sponsor, if any.
        active_sponsor: Option<PlayerSummary>,
        /// Available actions.
        actions: Vec<NodeAction>,
    },
    /// The current player's node.
    Root {
        /// Always "You".
        label: String,
        /// Accept/decline actions for incoming requests.
        actions: Vec<NodeAction>,
    },
    /// One of the two invite slots.
    InviteSlot {
        /// Leading or trailing slot.
        side: InviteSide,
        /// Slot label.
        label: String,
        /// Always [`NodeAction::SendInvite`].
        action: NodeAction,
    },
    /// A downline player.
    Player {
        /// Player alias.
        alias: String,
    },
}

/// A rendered tree node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct NodeView {
    /// Source node id.
    pub id: String,
    /// Draw a vertical line below this node.
    pub connector_down: bool,
    /// Draw a horizontal bar across this node's children.
    pub connector_across: bool,
    /// Node content.
    pub body: NodeBody,
    /// Rendered children.
    #[schema(no_recursion)]
    pub children: Vec<NodeView>,
}

/// Renders one node and its subtree.
#[must_use]
pub fn render_tree(node: &NetworkNode, ctx: &RenderContext<'_>) -> NodeView {
    let body = match node.id.as_str() {
        SPONSOR_NODE_ID => sponsor_body(node, ctx),
        ROOT_NODE_ID => NodeBody::Root {
            label: node.alias.clone(),
            actions: ctx
                .pending_downlines
                .iter()
                .flat_map(|p| {
                    [
                        NodeAction::AcceptDownline {
                            relationship_id: p.relationship_id,
                            player: p.player.clone(),
                        },
                        NodeAction::DeclineDownline {
                            relationship_id: p.relationship_id,
                            player: p.player.clone(),
                        },
                    ]
                })
                .collect(),
        },
        LEFT_INVITE_NODE_ID => invite_body(node, InviteSide::Left),
        RIGHT_INVITE_NODE_ID => invite_body(node, InviteSide::Right),
        _ => NodeBody::Player {
            alias: node.alias.clone(),
        },
    };

    NodeView {
        id: node.id.clone(),
        connector_down: !node.children.is_empty(),
        connector_across: node.children.len() > 1,
        body,
        children: node.children.iter().map(|c| render_tree(c, ctx)).collect(),
    }
}

/// Renders a whole aggregation result.
#[must_use]
pub fn render_network(network: &AggregatedNetwork) -> NodeView {
    render_tree(&network.network, &RenderContext::from_network(network))
}

fn sponsor_body(node: &NetworkNode, ctx: &RenderContext<'_>) -> NodeBody {
    let actions = match (ctx.active_sponsor, ctx.pending_request_id) {
        (Some(_), _) => Vec::new(),
        (None, Some(relationship_id)) => {
            vec![NodeAction::CancelSponsorRequest { relationship_id }]
        }
        (None, None) => ctx
            .admin_profiles
            .iter()
            .map(|admin| NodeAction::RequestSponsor {
                admin_profile_id: admin.id,
                alias: admin.alias.clone(),
            })
            .collect(),
    };
    NodeBody::Sponsor {
        label: node.alias.clone(),
        active_sponsor: ctx.active_sponsor.cloned(),
        actions,
    }
}

fn invite_body(node: &NetworkNode, side: InviteSide) -> NodeBody {
    NodeBody::InviteSlot {
        side,
        label: node.alias.clone(),
        action: NodeAction::SendInvite,
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::indexing_slicing)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::domain::SponsorState;
    use crate::domain::network_tree::{IN_REVIEW_LABEL, REQUEST_SPONSOR_LABEL};

    fn summary(alias: &str) -> PlayerSummary {
        PlayerSummary {
            id: PlayerId::new(),
            alias: alias.to_string(),
        }
    }

    fn network(
        sponsor: SponsorState,
        downlines: Vec<PlayerSummary>,
        pending: Vec<PendingDownline>,
        admins: Vec<PlayerSummary>,
    ) -> AggregatedNetwork {
        AggregatedNetwork::assemble(summary("Me"), sponsor, downlines, pending, admins, Vec::new())
    }

    #[test]
    fn connectors_follow_child_counts() {
        let view = render_network(&network(
            SponsorState::None,
            Vec::new(),
            Vec::new(),
            Vec::new(),
        ));
        // sponsor has one child: down, no bar
        assert!(view.connector_down);
        assert!(!view.connector_across);

        let root = &view.children[0];
        assert!(root.connector_down);
        assert!(root.connector_across);

        for slot in &root.children {
            assert!(!slot.connector_down);
            assert!(!slot.connector_across);
        }
    }

    #[test]
    fn nodes_dispatch_by_id() {
        let kid = summary("Alder");
        let view = render_network(&network(
            SponsorState::None,
            vec![kid.clone()],
            Vec::new(),
            Vec::new(),
        ));
        let root = &view.children[0];

        assert!(matches!(root.body, NodeBody::Root { .. }));
        assert!(matches!(
            root.children[0].body,
            NodeBody::InviteSlot { side: InviteSide::Left, .. }
        ));
        assert_eq!(
            root.children[1].body,
            NodeBody::Player {
                alias: kid.alias.clone()
            }
        );
        assert!(matches!(
            root.children[2].body,
            NodeBody::InviteSlot { side: InviteSide::Right, .. }
        ));
    }

    #[test]
    fn sponsor_offers_admins_without_request() {
        let ada = summary("Ada");
        let view = render_network(&network(
            SponsorState::None,
            Vec::new(),
            Vec::new(),
            vec![ada.clone()],
        ));
        let NodeBody::Sponsor { label, actions, .. } = &view.body else {
            panic!("expected sponsor body");
        };
        assert_eq!(label, REQUEST_SPONSOR_LABEL);
        assert_eq!(
            actions,
            &vec![NodeAction::RequestSponsor {
                admin_profile_id: ada.id,
                alias: ada.alias,
            }]
        );
    }

    #[test]
    fn pending_request_can_only_be_cancelled() {
        let request = RelationshipId::new();
        let view = render_network(&network(
            SponsorState::Requested(request),
            Vec::new(),
            Vec::new(),
            vec![summary("Ada")],
        ));
        let NodeBody::Sponsor { label, actions, .. } = &view.body else {
            panic!("expected sponsor body");
        };
        assert_eq!(label, IN_REVIEW_LABEL);
        assert_eq!(
            actions,
            &vec![NodeAction::CancelSponsorRequest {
                relationship_id: request
            }]
        );
    }

    #[test]
    fn incoming_requests_become_root_actions() {
        let asking = PendingDownline {
            relationship_id: RelationshipId::new(),
            player: summary("Cypress"),
            requested_at: Utc::now(),
        };
        let view = render_network(&network(
            SponsorState::Active(summary("Ada")),
            Vec::new(),
            vec![asking.clone()],
            Vec::new(),
        ));
        let NodeBody::Root { actions, .. } = &view.children[0].body else {
            panic!("expected root body");
        };
        assert_eq!(actions.len(), 2);
        assert!(actions.iter().all(|a| matches!(
            a,
            NodeAction::AcceptDownline { relationship_id, .. }
            | NodeAction::DeclineDownline { relationship_id, .. }
            if *relationship_id == asking.relationship_id
        )));

        let NodeBody::Sponsor { actions, .. } = &view.body else {
            panic!("expected sponsor body");
        };
        assert!(actions.is_empty());
    }
}
