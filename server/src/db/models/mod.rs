//! Database Models
//!
//! Serde structs for the SurrealDB tables. Record links use the
//! `serde_helpers` modules so IDs round-trip as `table:id` strings.

pub mod serde_helpers;

pub mod booking;
pub mod doctor;
pub mod rating;
pub mod slot;
pub mod ticket;
pub mod user;

pub use booking::{Booking, BookingStatus, CustomerDetails, Gender};
pub use doctor::DoctorProfile;
pub use rating::{Rating, RatingSummary};
pub use slot::{DoctorSnapshot, Slot, SlotCreate};
pub use ticket::Ticket;
pub use user::{ApprovalStatus, Role, User};
