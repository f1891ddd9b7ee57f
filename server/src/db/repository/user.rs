//! User Repository

use super::{BaseRepository, RepoError, RepoResult, parse_id};
use crate::db::models::{ApprovalStatus, User};
use serde::Deserialize;
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};

const TABLE: &str = "user";

#[derive(Debug, Deserialize)]
struct IdRow {
    #[serde(with = "crate::db::models::serde_helpers::record_id")]
    id: RecordId,
}

#[derive(Clone)]
pub struct UserRepository {
    base: BaseRepository,
}

impl UserRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Find user by id
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<User>> {
        let thing = parse_id(id)?;
        let user: Option<User> = self.base.db().select(thing).await?;
        Ok(user)
    }

    /// Create a user. Duplicate email surfaces as `RepoError::Duplicate`.
    pub async fn create(&self, user: User) -> RepoResult<User> {
        let created: Option<User> = self.base.db().create(TABLE).content(user).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create user".to_string()))
    }

    /// IDs of providers that are approved and active
    pub async fn approved_active_provider_ids(&self) -> RepoResult<Vec<RecordId>> {
        let rows: Vec<IdRow> = self
            .base
            .db()
            .query(
                "SELECT id FROM user WHERE role = 'provider' \
                 AND approval_status = 'approved' AND is_active = true",
            )
            .await?
            .take(0)?;
        Ok(rows.into_iter().map(|r| r.id).collect())
    }

    /// Admin moderation: set a provider's approval status
    pub async fn set_approval_status(&self, id: &str, status: ApprovalStatus) -> RepoResult<User> {
        let thing = parse_id(id)?;
        let status = match status {
            ApprovalStatus::Pending => "pending",
            ApprovalStatus::Approved => "approved",
            ApprovalStatus::Rejected => "rejected",
        };
        let updated: Vec<User> = self
            .base
            .db()
            .query("UPDATE $thing SET approval_status = $status RETURN AFTER")
            .bind(("thing", thing))
            .bind(("status", status.to_string()))
            .await?
            .take(0)?;
        updated
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::NotFound(format!("User {} not found", id)))
    }

    /// Hard delete a user account
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
