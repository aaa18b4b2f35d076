//! Domain layer: players, relationships, invites, the derived network
//! tree, and the event system.

pub mod event_bus;
pub mod ids;
pub mod invite;
pub mod network_event;
pub mod network_tree;
pub mod player;
pub mod relationship;

pub use event_bus::EventBus;
pub use ids::{AuthUserId, InviteId, PlayerId, RelationshipId};
pub use invite::{Invite, InviteStatus, NewInvite};
pub use network_event::NetworkEvent;
pub use network_tree::{AggregatedNetwork, NetworkNode, PendingDownline, SponsorState};
pub use player::{NewPlayer, Player, PlayerRole, PlayerSummary};
pub use relationship::{Relationship, RelationshipStatus};
