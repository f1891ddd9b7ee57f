//! Rating Model

use super::serde_helpers;
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

/// Write-once rating of a provider by a user.
///
/// At most one rating per (rater, doctor) pair, enforced by a unique index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rating {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "serde_helpers::option_record_id"
    )]
    pub id: Option<RecordId>,
    /// Rating user
    #[serde(with = "serde_helpers::record_id")]
    pub rater: RecordId,
    /// Rated provider (user record)
    #[serde(with = "serde_helpers::record_id")]
    pub doctor: RecordId,
    /// Value in [0, 5]
    pub value: f64,
}

/// Aggregate returned by the rating read/write paths
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatingSummary {
    pub average: f64,
    pub count: i64,
    /// The requester's own rating, if they have rated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub my_rating: Option<f64>,
}
