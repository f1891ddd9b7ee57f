//! Event publisher seam
//!
//! Services receive an `Arc<dyn EventPublisher>` at construction instead of
//! reaching for process-wide state; the "bus not initialized" failure mode
//! cannot exist. Tests inject [`NoopPublisher`] or [`RecordingPublisher`].

use std::fmt;
use std::sync::Mutex;

use super::{BusMessage, MessageBus};

/// Publishing seam for the event feed
pub trait EventPublisher: Send + Sync + fmt::Debug {
    /// Fire-and-forget publish; must never fail the caller.
    fn publish(&self, msg: BusMessage);
}

impl EventPublisher for MessageBus {
    fn publish(&self, msg: BusMessage) {
        tracing::debug!(topic = %msg.topic, entity = %msg.entity_id, "publishing event");
        self.broadcast(msg);
    }
}

/// Publisher that drops everything (tests, tooling)
#[derive(Debug, Default, Clone)]
pub struct NoopPublisher;

impl EventPublisher for NoopPublisher {
    fn publish(&self, _msg: BusMessage) {}
}

/// Test double capturing every published message
#[derive(Debug, Default)]
pub struct RecordingPublisher {
    messages: Mutex<Vec<BusMessage>>,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<BusMessage> {
        self.messages.lock().expect("publisher lock").clone()
    }

    pub fn topics(&self) -> Vec<super::EventTopic> {
        self.messages().into_iter().map(|m| m.topic).collect()
    }
}

impl EventPublisher for RecordingPublisher {
    fn publish(&self, msg: BusMessage) {
        self.messages.lock().expect("publisher lock").push(msg);
    }
}
