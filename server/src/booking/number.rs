//! Booking number generation
//!
//! Numbers are a fixed brand tag plus 8 random hex characters, e.g.
//! `CS-1A2B3C4D`. Global uniqueness is enforced by the unique index on
//! `booking.number`; the service regenerates and retries on the rare
//! collision.

use rand::Rng;

pub const BOOKING_NUMBER_PREFIX: &str = "CS-";

/// Attempts before a persistent uniqueness conflict becomes an internal error
pub const MAX_GENERATION_ATTEMPTS: u32 = 5;

/// Generate a candidate booking number
pub fn generate() -> String {
    let token: u32 = rand::thread_rng().r#gen();
    format!("{BOOKING_NUMBER_PREFIX}{token:08X}")
}
