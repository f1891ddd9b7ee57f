//! Appointment Slot Model

use super::serde_helpers;
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

/// Provider display snapshot embedded into slots, bookings and tickets.
///
/// Copied at each creation boundary so later edits to the provider profile
/// never retroactively alter historical records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorSnapshot {
    pub name: String,
    pub location: String,
    #[serde(default)]
    pub rating: f64,
    pub contact_email: String,
}

/// Offerable appointment window published by a provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Slot {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "serde_helpers::option_record_id"
    )]
    pub id: Option<RecordId>,
    /// Owning provider (user record)
    #[serde(with = "serde_helpers::record_id")]
    pub provider: RecordId,
    /// Calendar day, `YYYY-MM-DD`, no timezone field (interpreted as UTC)
    pub date: String,
    /// Wall-clock start time, `HH:MM`
    pub time: String,
    pub duration_minutes: i32,
    pub price: f64,
    pub department: String,
    /// Provider display snapshot captured at slot creation
    pub doctor: DoctorSnapshot,
    #[serde(default, deserialize_with = "serde_helpers::bool_false")]
    pub is_booked: bool,
}

/// Create slot payload (provider comes from the authenticated principal)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotCreate {
    pub date: String,
    pub time: String,
    pub duration_minutes: i32,
    pub price: f64,
    pub department: String,
}
