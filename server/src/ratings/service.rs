//! Rating service
//!
//! A user rates a doctor (the provider account) at most once; the aggregate
//! on the doctor profile is recomputed from the whole rating table after
//! every insert, never adjusted incrementally.

use std::sync::Arc;

use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use crate::auth::Principal;
use crate::db::models::{Rating, RatingSummary, Role};
use crate::db::repository::{
    DoctorRepository, RatingRepository, RepoError, UserRepository, parse_id,
};
use crate::message::{BusMessage, EventPublisher, EventTopic};
use crate::utils::AppError;

pub const MIN_RATING_VALUE: f64 = 0.0;
pub const MAX_RATING_VALUE: f64 = 5.0;

#[derive(Clone)]
pub struct RatingService {
    db: Surreal<Db>,
    publisher: Arc<dyn EventPublisher>,
}

impl RatingService {
    pub fn new(db: Surreal<Db>, publisher: Arc<dyn EventPublisher>) -> Self {
        Self { db, publisher }
    }

    /// Record a rating and return the recomputed aggregate.
    ///
    /// Ratings are write-once: a second rating from the same user is a
    /// conflict, not an update.
    pub async fn rate(
        &self,
        doctor_id: &str,
        principal: &Principal,
        value: f64,
    ) -> Result<RatingSummary, AppError> {
        if !(MIN_RATING_VALUE..=MAX_RATING_VALUE).contains(&value) || !value.is_finite() {
            return Err(AppError::Validation(format!(
                "rating must be between {MIN_RATING_VALUE} and {MAX_RATING_VALUE}"
            )));
        }

        let doctor = self.resolve_provider(doctor_id).await?;
        let rater = parse_id(&principal.user_id)?;

        let ratings = RatingRepository::new(self.db.clone());
        let rating = Rating {
            id: None,
            rater,
            doctor: doctor.clone(),
            value,
        };
        match ratings.create(rating).await {
            Ok(_) => {}
            Err(RepoError::Duplicate(_)) => {
                return Err(AppError::Conflict(format!(
                    "You have already rated doctor {doctor_id}"
                )));
            }
            Err(e) => return Err(e.into()),
        }

        let (average, count) = ratings.aggregate_for(&doctor).await?;
        DoctorRepository::new(self.db.clone())
            .update_rating(&doctor, average, count)
            .await?;

        self.publisher.publish(
            BusMessage::new(EventTopic::DoctorRatingUpdated, doctor.to_string())
                .with_data(&serde_json::json!({ "average": average, "count": count })),
        );

        Ok(RatingSummary {
            average,
            count,
            my_rating: Some(value),
        })
    }

    /// Current aggregate for a doctor, personalized with the caller's own
    /// rating when they are authenticated.
    pub async fn get_rating(
        &self,
        doctor_id: &str,
        principal: Option<&Principal>,
    ) -> Result<RatingSummary, AppError> {
        let doctor = self.resolve_provider(doctor_id).await?;
        let ratings = RatingRepository::new(self.db.clone());
        let (average, count) = ratings.aggregate_for(&doctor).await?;

        let my_rating = match principal {
            Some(p) => {
                let rater = parse_id(&p.user_id)?;
                ratings
                    .find_by_rater_and_doctor(&rater, &doctor)
                    .await?
                    .map(|r| r.value)
            }
            None => None,
        };

        Ok(RatingSummary {
            average,
            count,
            my_rating,
        })
    }

    /// Ratings target the provider account; the target must exist and be a
    /// provider.
    async fn resolve_provider(&self, doctor_id: &str) -> Result<surrealdb::RecordId, AppError> {
        let user = UserRepository::new(self.db.clone())
            .find_by_id(doctor_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Doctor {doctor_id} not found")))?;
        if user.role != Role::Provider {
            return Err(AppError::NotFound(format!("Doctor {doctor_id} not found")));
        }
        user.id
            .ok_or_else(|| AppError::Internal("user has no record id".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbService;
    use crate::db::models::{ApprovalStatus, User};
    use crate::message::RecordingPublisher;

    async fn service() -> (RatingService, Arc<RecordingPublisher>) {
        let db = DbService::memory().await.expect("in-memory db").db;
        let publisher = Arc::new(RecordingPublisher::new());
        let svc = RatingService::new(db, publisher.clone());
        (svc, publisher)
    }

    async fn seed_doctor(svc: &RatingService) -> String {
        let users = UserRepository::new(svc.db.clone());
        let user = users
            .create(User {
                id: None,
                email: "dr@clinic.test".to_string(),
                name: "Dr Rated".to_string(),
                role: Role::Provider,
                approval_status: Some(ApprovalStatus::Approved),
                is_active: true,
            })
            .await
            .expect("seed doctor");
        let doctor_id = user.id.expect("user id");
        DoctorRepository::new(svc.db.clone())
            .create_if_missing(crate::db::models::DoctorProfile {
                id: None,
                provider: doctor_id.clone(),
                name: "Dr Rated".to_string(),
                speciality: "Cardiology".to_string(),
                location: "Ward 3".to_string(),
                contact_email: "dr@clinic.test".to_string(),
                rating_avg: 0.0,
                rating_count: 0,
            })
            .await
            .expect("seed profile");
        doctor_id.to_string()
    }

    fn rater(n: u32) -> Principal {
        Principal::new(
            format!("user:rater{n}"),
            format!("rater{n}@example.com"),
            Role::Customer,
        )
    }

    #[tokio::test]
    async fn aggregate_is_recomputed_over_all_ratings() {
        let (svc, publisher) = service().await;
        let doctor = seed_doctor(&svc).await;

        svc.rate(&doctor, &rater(1), 3.0).await.unwrap();
        svc.rate(&doctor, &rater(2), 4.0).await.unwrap();
        let summary = svc.rate(&doctor, &rater(3), 5.0).await.unwrap();

        assert_eq!(summary.count, 3);
        assert!((summary.average - 4.0).abs() < f64::EPSILON);
        assert_eq!(summary.my_rating, Some(5.0));

        // The cached aggregate on the profile matches
        let profile = DoctorRepository::new(svc.db.clone())
            .find_by_provider(&doctor.parse().unwrap())
            .await
            .unwrap()
            .unwrap();
        assert!((profile.rating_avg - 4.0).abs() < f64::EPSILON);
        assert_eq!(profile.rating_count, 3);

        assert_eq!(
            publisher
                .topics()
                .iter()
                .filter(|t| **t == EventTopic::DoctorRatingUpdated)
                .count(),
            3
        );
    }

    #[tokio::test]
    async fn second_rating_from_same_user_conflicts() {
        let (svc, _) = service().await;
        let doctor = seed_doctor(&svc).await;

        svc.rate(&doctor, &rater(1), 2.0).await.unwrap();
        let err = svc.rate(&doctor, &rater(1), 5.0).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        // The rejected write must not have touched the aggregate
        let summary = svc.get_rating(&doctor, None).await.unwrap();
        assert_eq!(summary.count, 1);
        assert!((summary.average - 2.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn out_of_range_values_are_rejected() {
        let (svc, _) = service().await;
        let doctor = seed_doctor(&svc).await;

        for bad in [-0.5, 5.5, f64::NAN] {
            assert!(matches!(
                svc.rate(&doctor, &rater(1), bad).await.unwrap_err(),
                AppError::Validation(_)
            ));
        }
        // Bounds themselves are valid
        svc.rate(&doctor, &rater(1), 0.0).await.unwrap();
        svc.rate(&doctor, &rater(2), 5.0).await.unwrap();
    }

    #[tokio::test]
    async fn rating_unknown_doctor_is_not_found() {
        let (svc, _) = service().await;
        let err = svc.rate("user:ghost", &rater(1), 4.0).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn read_is_personalized_for_the_rater() {
        let (svc, _) = service().await;
        let doctor = seed_doctor(&svc).await;
        let alice = rater(1);

        svc.rate(&doctor, &alice, 4.0).await.unwrap();

        let anonymous = svc.get_rating(&doctor, None).await.unwrap();
        assert_eq!(anonymous.my_rating, None);
        assert_eq!(anonymous.count, 1);

        let personal = svc.get_rating(&doctor, Some(&alice)).await.unwrap();
        assert_eq!(personal.my_rating, Some(4.0));

        let other = svc.get_rating(&doctor, Some(&rater(2))).await.unwrap();
        assert_eq!(other.my_rating, None);
    }
}
