//! Booking Repository

use super::{BaseRepository, RepoError, RepoResult, parse_id};
use crate::db::models::{Booking, BookingStatus};
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};

const TABLE: &str = "booking";

#[derive(Clone)]
pub struct BookingRepository {
    base: BaseRepository,
}

impl BookingRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Find booking by id
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Booking>> {
        let thing = parse_id(id)?;
        let booking: Option<Booking> = self.base.db().select(thing).await?;
        Ok(booking)
    }

    /// The active (status = booked) booking for a slot, if any
    pub async fn find_active_by_slot(&self, slot: &RecordId) -> RepoResult<Option<Booking>> {
        let bookings: Vec<Booking> = self
            .base
            .db()
            .query("SELECT * FROM booking WHERE slot = $slot AND status = 'booked' LIMIT 1")
            .bind(("slot", slot.to_string()))
            .await?
            .take(0)?;
        Ok(bookings.into_iter().next())
    }

    /// Insert a booking. A unique-index violation on `number` comes back as
    /// `RepoError::Duplicate` so the caller can regenerate and retry.
    pub async fn create(&self, booking: Booking) -> RepoResult<Booking> {
        let created: Option<Booking> = self.base.db().create(TABLE).content(booking).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create booking".to_string()))
    }

    /// Status-only write. Validation is deliberately relaxed here: older
    /// records may lack newer required fields, and forced cancellation must
    /// still succeed on them.
    pub async fn set_status(&self, id: &str, status: BookingStatus) -> RepoResult<()> {
        let thing = parse_id(id)?;
        let status = serde_json::to_value(status)
            .map_err(|e| RepoError::Database(e.to_string()))?
            .as_str()
            .unwrap_or("cancelled")
            .to_string();
        self.base
            .db()
            .query("UPDATE $thing SET status = $status")
            .bind(("thing", thing))
            .bind(("status", status))
            .await?;
        Ok(())
    }

    /// Hard delete a booking record
    pub async fn delete(&self, id: &str) -> RepoResult<bool> {
        let thing = parse_id(id)?;
        self.base
            .db()
            .query("DELETE $thing")
            .bind(("thing", thing))
            .await?;
        Ok(true)
    }
}
