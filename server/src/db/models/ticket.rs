//! Ticket Model
//!
//! Fully denormalized display/print artifact derived from a booking.
//! Created once, never mutated. Tickets are permanent historical records:
//! deleting a booking leaves its ticket in place.

use super::serde_helpers;
use super::slot::DoctorSnapshot;
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "serde_helpers::option_record_id"
    )]
    pub id: Option<RecordId>,
    #[serde(with = "serde_helpers::record_id")]
    pub booking: RecordId,
    pub booking_number: String,
    pub customer_name: String,
    pub customer_email: String,
    pub doctor: DoctorSnapshot,
    pub fee: f64,
    pub date: String,
    pub time: String,
    pub department: String,
}
