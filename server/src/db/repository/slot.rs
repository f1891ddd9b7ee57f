//! Slot Repository

use super::{BaseRepository, RepoError, RepoResult, parse_id};
use crate::db::models::Slot;
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};

const TABLE: &str = "slot";

#[derive(Clone)]
pub struct SlotRepository {
    base: BaseRepository,
}

impl SlotRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Find slot by id
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Slot>> {
        let thing = parse_id(id)?;
        let slot: Option<Slot> = self.base.db().select(thing).await?;
        Ok(slot)
    }

    /// All slots owned by a provider, soonest first
    ///
    /// Link fields are persisted as `table:id` strings (see
    /// `models::serde_helpers`), so comparisons bind strings.
    pub async fn find_by_provider(&self, provider: &RecordId) -> RepoResult<Vec<Slot>> {
        let slots: Vec<Slot> = self
            .base
            .db()
            .query("SELECT * FROM slot WHERE provider = $provider ORDER BY date, time")
            .bind(("provider", provider.to_string()))
            .await?
            .take(0)?;
        Ok(slots)
    }

    /// Public listing: slots whose provider is in the visible set, sorted by
    /// date then time ascending.
    pub async fn find_visible(&self, providers: Vec<RecordId>) -> RepoResult<Vec<Slot>> {
        let providers: Vec<String> = providers.iter().map(|p| p.to_string()).collect();
        let slots: Vec<Slot> = self
            .base
            .db()
            .query("SELECT * FROM slot WHERE provider IN $providers ORDER BY date, time")
            .bind(("providers", providers))
            .await?
            .take(0)?;
        Ok(slots)
    }

    /// Create a new slot
    pub async fn create(&self, slot: Slot) -> RepoResult<Slot> {
        let created: Option<Slot> = self.base.db().create(TABLE).content(slot).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create slot".to_string()))
    }

    /// Atomically claim the slot: flip `is_booked` only if it is still false.
    ///
    /// Returns the updated slot, or `None` when the conditional write did not
    /// match (slot already booked, the caller lost the race).
    pub async fn claim_if_free(&self, id: &str) -> RepoResult<Option<Slot>> {
        let thing = parse_id(id)?;
        let updated: Vec<Slot> = self
            .base
            .db()
            .query("UPDATE $thing SET is_booked = true WHERE is_booked = false RETURN AFTER")
            .bind(("thing", thing))
            .await?
            .take(0)?;
        Ok(updated.into_iter().next())
    }

    /// Release a previously claimed slot
    pub async fn release(&self, id: &str) -> RepoResult<()> {
        let thing = parse_id(id)?;
        self.base
            .db()
            .query("UPDATE $thing SET is_booked = false")
            .bind(("thing", thing))
            .await?;
        Ok(())
    }

    /// Hard delete a slot
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
