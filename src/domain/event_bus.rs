//! Fan-out of [`NetworkEvent`]s to live WebSocket connections.
//!
//! Services publish after a relationship or invite change commits.
//! Delivery is best effort: events published while nobody listens are
//! dropped, and a connection that falls more than `capacity` events
//! behind skips ahead (see [`broadcast::error::RecvError::Lagged`]).
//! The cached networks never depend on the bus.

use tokio::sync::broadcast;

use super::NetworkEvent;

/// Cloneable handle to the shared network event channel.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<NetworkEvent>,
}

impl EventBus {
    /// Creates a bus buffering up to `capacity` events per lagging
    /// connection. A zero capacity is raised to one.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Sends `event` to every connected subscriber and returns how many
    /// there were.
    pub fn publish(&self, event: NetworkEvent) -> usize {
        let event_type = event.event_type_str();
        let delivered = self.sender.send(event).unwrap_or(0);
        tracing::trace!(event_type, delivered, "network event published");
        delivered
    }

    /// Opens a receiver for events published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<NetworkEvent> {
        self.sender.subscribe()
    }

    /// Number of open receivers, reported by the health endpoint.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
