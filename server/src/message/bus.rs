//! Message bus core
//!
//! ```text
//! Service ──▶ publish() ──▶ broadcast::Sender<BusMessage> ──▶ subscribers
//! ```
//!
//! Backed by a tokio broadcast channel: lagging receivers drop messages,
//! nothing is replayed, and publishing with no subscribers is a no-op.

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use super::BusMessage;

/// Bus configuration
#[derive(Debug, Clone)]
pub struct MessageBusConfig {
    /// Capacity of the broadcast channel
    pub channel_capacity: usize,
}

impl Default for MessageBusConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 1024,
        }
    }
}

/// In-process event bus
#[derive(Debug, Clone)]
pub struct MessageBus {
    tx: broadcast::Sender<BusMessage>,
    shutdown_token: CancellationToken,
}

impl MessageBus {
    pub fn new() -> Self {
        Self::from_config(MessageBusConfig::default())
    }

    pub fn from_config(config: MessageBusConfig) -> Self {
        let (tx, _) = broadcast::channel(config.channel_capacity);
        Self {
            tx,
            shutdown_token: CancellationToken::new(),
        }
    }

    /// Broadcast a message to all current subscribers.
    ///
    /// A send with zero receivers is normal operation, not an error.
    pub fn broadcast(&self, msg: BusMessage) {
        let _ = self.tx.send(msg);
    }

    /// Subscribe to the feed
    pub fn subscribe(&self) -> broadcast::Receiver<BusMessage> {
        self.tx.subscribe()
    }

    /// Number of live subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Token observed by background consumers for graceful shutdown
    pub fn shutdown_token(&self) -> &CancellationToken {
        &self.shutdown_token
    }

    pub fn shutdown(&self) {
        tracing::info!("Shutting down message bus");
        self.shutdown_token.cancel();
    }
}

impl Default for MessageBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::EventTopic;

    #[tokio::test]
    async fn broadcast_reaches_subscriber() {
        let bus = MessageBus::new();
        let mut rx = bus.subscribe();

        bus.broadcast(BusMessage::new(EventTopic::SlotCreated, "slot:a"));

        let msg = rx.recv().await.unwrap();
        assert_eq!(msg.topic, EventTopic::SlotCreated);
        assert_eq!(msg.entity_id, "slot:a");
    }

    #[tokio::test]
    async fn broadcast_without_subscribers_is_noop() {
        let bus = MessageBus::new();
        // Must not panic or error
        bus.broadcast(BusMessage::new(EventTopic::SlotDeleted, "slot:b"));
        assert_eq!(bus.subscriber_count(), 0);
    }
}
