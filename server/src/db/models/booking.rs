//! Booking Model

use super::serde_helpers;
use super::slot::DoctorSnapshot;
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

/// Booking lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Booked,
    Completed,
    Cancelled,
}

/// Customer gender, constrained to an enumerated set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

/// Customer contact fields captured at claim time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerDetails {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub age: i32,
    pub gender: Gender,
}

/// Confirmed reservation against a slot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "serde_helpers::option_record_id"
    )]
    pub id: Option<RecordId>,
    /// Slot the booking was created from
    #[serde(with = "serde_helpers::record_id")]
    pub slot: RecordId,
    /// Globally unique human-readable booking number, e.g. `CS-1A2B3C4D`
    pub number: String,
    pub customer: CustomerDetails,
    /// Doctor display snapshot copied from the slot at booking time
    pub doctor: DoctorSnapshot,
    /// Fee copied at booking time, decoupled from later slot edits
    pub fee: f64,
    pub status: BookingStatus,
}
