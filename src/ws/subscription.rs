//! Per-connection subscription manager.
//!
//! Tracks which player IDs a WebSocket client follows and filters
//! [`NetworkEvent`]s server-side: an event matches when it touches any
//! followed player.

use std::collections::HashSet;

use crate::domain::{NetworkEvent, PlayerId};

/// Manages the set of player subscriptions for a single WebSocket
/// connection.
#[derive(Debug, Default)]
pub struct SubscriptionManager {
    /// Followed players. Ignored while `subscribe_all` is set.
    player_ids: HashSet<PlayerId>,
    /// Whether the client follows every player (wildcard `"*"`).
    subscribe_all: bool,
}

impl SubscriptionManager {
    /// Creates a new empty subscription manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds player IDs to the subscription set.
    pub fn subscribe(&mut self, ids: &[PlayerId], wildcard: bool) {
        if wildcard {
            self.subscribe_all = true;
        }
        self.player_ids.extend(ids.iter().copied());
    }

    /// Removes player IDs from the subscription set.
    pub fn unsubscribe(&mut self, ids: &[PlayerId]) {
        for id in ids {
            self.player_ids.remove(id);
        }
    }

    /// Returns `true` if `event` touches a followed player.
    #[must_use]
    pub fn matches(&self, event: &NetworkEvent) -> bool {
        self.subscribe_all || self.player_ids.iter().any(|id| event.involves(*id))
    }

    /// Returns the number of explicitly followed players.
    #[must_use]
    pub fn count(&self) -> usize {
        self.player_ids.len()
    }

    /// Returns `true` if the wildcard subscription is active.
    #[must_use]
    pub fn is_subscribed_all(&self) -> bool {
        self.subscribe_all
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::domain::RelationshipId;

    fn accepted(upline: PlayerId, downline: PlayerId) -> NetworkEvent {
        NetworkEvent::RelationshipAccepted {
            relationship_id: RelationshipId::new(),
            upline_id: upline,
            downline_id: downline,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn empty_matches_nothing() {
        let mgr = SubscriptionManager::new();
        assert!(!mgr.matches(&accepted(PlayerId::new(), PlayerId::new())));
    }

    #[test]
    fn either_end_of_a_relationship_matches() {
        let mut mgr = SubscriptionManager::new();
        let me = PlayerId::new();
        mgr.subscribe(&[me], false);
        assert!(mgr.matches(&accepted(me, PlayerId::new())));
        assert!(mgr.matches(&accepted(PlayerId::new(), me)));
        assert!(!mgr.matches(&accepted(PlayerId::new(), PlayerId::new())));
    }

    #[test]
    fn wildcard_matches_everything() {
        let mut mgr = SubscriptionManager::new();
        mgr.subscribe(&[], true);
        assert!(mgr.is_subscribed_all());
        assert!(mgr.matches(&accepted(PlayerId::new(), PlayerId::new())));
    }

    #[test]
    fn unsubscribe_removes_player() {
        let mut mgr = SubscriptionManager::new();
        let me = PlayerId::new();
        mgr.subscribe(&[me, PlayerId::new()], false);
        assert_eq!(mgr.count(), 2);
        mgr.unsubscribe(&[me]);
        assert_eq!(mgr.count(), 1);
        assert!(!mgr.matches(&accepted(me, PlayerId::new())));
    }
}
