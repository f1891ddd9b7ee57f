//! Booking domain
//!
//! Slot claim, cancellation, deletion, and booking number allocation.

pub mod number;
mod service;

pub use service::{
    BookingDeleteOutcome, BookingService, CANCEL_CUTOFF_HOURS, CancelOutcome, ClaimOutcome,
    SlotDeleteOutcome,
};
