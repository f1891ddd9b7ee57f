//! Rating Repository

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::Rating;
use serde::Deserialize;
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};

const TABLE: &str = "rating";

/// Aggregate row returned by the recompute query
#[derive(Debug, Deserialize)]
struct AggregateRow {
    average: Option<f64>,
    count: i64,
}

#[derive(Clone)]
pub struct RatingRepository {
    base: BaseRepository,
}

impl RatingRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Insert a rating. The unique (rater, doctor) index turns a second
    /// rating from the same user into `RepoError::Duplicate`.
    pub async fn create(&self, rating: Rating) -> RepoResult<Rating> {
        let created: Option<Rating> = self.base.db().create(TABLE).content(rating).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create rating".to_string()))
    }

    /// The requester's own rating of a doctor, if present
    pub async fn find_by_rater_and_doctor(
        &self,
        rater: &RecordId,
        doctor: &RecordId,
    ) -> RepoResult<Option<Rating>> {
        let ratings: Vec<Rating> = self
            .base
            .db()
            .query("SELECT * FROM rating WHERE rater = $rater AND doctor = $doctor LIMIT 1")
            .bind(("rater", rater.to_string()))
            .bind(("doctor", doctor.to_string()))
            .await?
            .take(0)?;
        Ok(ratings.into_iter().next())
    }

    /// Full recompute of the aggregate for a doctor: arithmetic mean and row
    /// count over the whole rating table, never an incremental update.
    pub async fn aggregate_for(&self, doctor: &RecordId) -> RepoResult<(f64, i64)> {
        let rows: Vec<AggregateRow> = self
            .base
            .db()
            .query(
                "SELECT math::mean(value) AS average, count() AS count \
                 FROM rating WHERE doctor = $doctor GROUP ALL",
            )
            .bind(("doctor", doctor.to_string()))
            .await?
            .take(0)?;
        Ok(rows
            .into_iter()
            .next()
            .map(|r| (r.average.unwrap_or(0.0), r.count))
            .unwrap_or((0.0, 0)))
    }
}
