//! Doctor Profile Model
//!
//! Public denormalized provider profile, created lazily on first slot
//! creation. Carries the cached rating aggregate: a full recompute of the
//! rating table is written here on every rating insert.

use super::serde_helpers;
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorProfile {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "serde_helpers::option_record_id"
    )]
    pub id: Option<RecordId>,
    /// Backing provider account (user record), unique per profile
    #[serde(with = "serde_helpers::record_id")]
    pub provider: RecordId,
    pub name: String,
    pub speciality: String,
    pub location: String,
    pub contact_email: String,
    /// Cached aggregate of the rating table
    #[serde(default)]
    pub rating_avg: f64,
    #[serde(default)]
    pub rating_count: i64,
}
