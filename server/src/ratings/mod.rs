//! Doctor ratings
//!
//! Write-once ratings with a full aggregate recompute on every insert.

mod service;

pub use service::{MAX_RATING_VALUE, MIN_RATING_VALUE, RatingService};
