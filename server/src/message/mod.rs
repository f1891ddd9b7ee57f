//! Event feed
//!
//! Fire-and-forget publish/subscribe channel used as a UI refresh hint.
//! At-most-once delivery, no replay; consumers must never treat it as the
//! system of record.

mod bus;
mod publisher;

pub use bus::{MessageBus, MessageBusConfig};
pub use publisher::{EventPublisher, NoopPublisher, RecordingPublisher};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Event topics carried on the bus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventTopic {
    SlotCreated,
    SlotUpdated,
    SlotDeleted,
    BookingCreated,
    BookingCancelled,
    TicketCreated,
    DoctorRatingUpdated,
    DoctorApproved,
    DoctorRejected,
    UserRemoved,
}

impl fmt::Display for EventTopic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EventTopic::SlotCreated => "slot_created",
            EventTopic::SlotUpdated => "slot_updated",
            EventTopic::SlotDeleted => "slot_deleted",
            EventTopic::BookingCreated => "booking_created",
            EventTopic::BookingCancelled => "booking_cancelled",
            EventTopic::TicketCreated => "ticket_created",
            EventTopic::DoctorRatingUpdated => "doctor_rating_updated",
            EventTopic::DoctorApproved => "doctor_approved",
            EventTopic::DoctorRejected => "doctor_rejected",
            EventTopic::UserRemoved => "user_removed",
        };
        write!(f, "{s}")
    }
}

/// A single event on the bus: the affected entity's identifier plus the
/// minimal changed fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusMessage {
    pub topic: EventTopic,
    pub entity_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    pub timestamp: i64,
}

impl BusMessage {
    pub fn new(topic: EventTopic, entity_id: impl Into<String>) -> Self {
        Self {
            topic,
            entity_id: entity_id.into(),
            data: None,
            timestamp: Utc::now().timestamp_millis(),
        }
    }

    pub fn with_data<T: Serialize>(mut self, data: &T) -> Self {
        self.data = serde_json::to_value(data).ok();
        self
    }
}
