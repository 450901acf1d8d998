//! Broadcast-channel [`Notifier`] feeding the `/events` websocket.

use fundline_core::notify::{LedgerEvent, Notifier};
use tokio::sync::broadcast;

/// Publishes ledger events to every subscribed websocket.
#[derive(Debug, Clone)]
pub struct BroadcastNotifier {
    sender: broadcast::Sender<LedgerEvent>,
}

impl BroadcastNotifier {
    /// Creates a notifier whose channel buffers `capacity` events per subscriber.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Returns a handle for subscribing.
    #[must_use]
    pub fn sender(&self) -> broadcast::Sender<LedgerEvent> {
        self.sender.clone()
    }
}

impl Notifier for BroadcastNotifier {
    fn announce(&self, event: LedgerEvent) {
        // No subscribers is not an error.
        if self.sender.send(event).is_err() {
            tracing::debug!(event = %event, "no event subscribers");
        }
    }
}
