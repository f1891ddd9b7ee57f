//! Doctor Profile Repository

use super::{BaseRepository, RepoError, RepoResult, parse_id};
use crate::db::models::DoctorProfile;
use serde::Deserialize;
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};

const TABLE: &str = "doctor";

#[derive(Debug, Deserialize)]
struct ProviderRow {
    #[serde(with = "crate::db::models::serde_helpers::record_id")]
    provider: RecordId,
}

#[derive(Clone)]
pub struct DoctorRepository {
    base: BaseRepository,
}

impl DoctorRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Find profile by id
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<DoctorProfile>> {
        let thing = parse_id(id)?;
        let profile: Option<DoctorProfile> = self.base.db().select(thing).await?;
        Ok(profile)
    }

    /// Find the profile backing a provider account
    pub async fn find_by_provider(&self, provider: &RecordId) -> RepoResult<Option<DoctorProfile>> {
        let profiles: Vec<DoctorProfile> = self
            .base
            .db()
            .query("SELECT * FROM doctor WHERE provider = $provider LIMIT 1")
            .bind(("provider", provider.to_string()))
            .await?
            .take(0)?;
        Ok(profiles.into_iter().next())
    }

    /// Lazily create the public profile on first slot creation. Returns the
    /// existing profile when one is already present.
    pub async fn create_if_missing(&self, profile: DoctorProfile) -> RepoResult<DoctorProfile> {
        if let Some(existing) = self.find_by_provider(&profile.provider).await? {
            return Ok(existing);
        }
        match self.base.db().create(TABLE).content(profile.clone()).await {
            Ok(Some(created)) => Ok(created),
            Ok(None) => Err(RepoError::Database(
                "Failed to create doctor profile".to_string(),
            )),
            // Concurrent first-slot creation lost the unique-index race;
            // the winner's profile is the one to use.
            Err(e) => match RepoError::from(e) {
                RepoError::Duplicate(_) => self
                    .find_by_provider(&profile.provider)
                    .await?
                    .ok_or_else(|| {
                        RepoError::Database("Doctor profile vanished after race".to_string())
                    }),
                other => Err(other),
            },
        }
    }

    /// Provider IDs that have a public profile record
    pub async fn provider_ids_with_profile(&self) -> RepoResult<Vec<RecordId>> {
        let rows: Vec<ProviderRow> = self
            .base
            .db()
            .query("SELECT provider FROM doctor")
            .await?
            .take(0)?;
        Ok(rows.into_iter().map(|r| r.provider).collect())
    }

    /// Persist the recomputed rating aggregate onto the profile
    pub async fn update_rating(
        &self,
        provider: &RecordId,
        average: f64,
        count: i64,
    ) -> RepoResult<()> {
        self.base
            .db()
            .query(
                "UPDATE doctor SET rating_avg = $avg, rating_count = $count \
                 WHERE provider = $provider",
            )
            .bind(("avg", average))
            .bind(("count", count))
            .bind(("provider", provider.to_string()))
            .await?;
        Ok(())
    }

    /// Hard delete a profile (admin user removal cascade)
    pub async fn delete_by_provider(&self, provider: &RecordId) -> RepoResult<()> {
        self.base
            .db()
            .query("DELETE doctor WHERE provider = $provider")
            .bind(("provider", provider.to_string()))
            .await?;
        Ok(())
    }
}
