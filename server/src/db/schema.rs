//! Schema definitions applied at startup
//!
//! The tables stay schemaless; only the uniqueness constraints the booking
//! core depends on are defined here.

use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use crate::utils::AppError;

const DEFINES: &[&str] = &[
    // A booking number is unique across all bookings.
    "DEFINE INDEX IF NOT EXISTS uniq_booking_number ON TABLE booking COLUMNS number UNIQUE",
    // Ratings are write-once per (rater, doctor) pair.
    "DEFINE INDEX IF NOT EXISTS uniq_rating_pair ON TABLE rating COLUMNS rater, doctor UNIQUE",
    // Account emails are unique.
    "DEFINE INDEX IF NOT EXISTS uniq_user_email ON TABLE user COLUMNS email UNIQUE",
    // One public profile per provider.
    "DEFINE INDEX IF NOT EXISTS uniq_doctor_provider ON TABLE doctor COLUMNS provider UNIQUE",
];

/// Apply index definitions. Idempotent, runs on every startup.
pub async fn define(db: &Surreal<Db>) -> Result<(), AppError> {
    for stmt in DEFINES {
        db.query(*stmt)
            .await
            .map_err(|e| AppError::Database(format!("Failed to define schema: {e}")))?;
    }
    tracing::debug!("Schema indexes defined");
    Ok(())
}
