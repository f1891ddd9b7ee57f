//! End-to-end booking flow tests over the service layer
//!
//! In-memory database, noop mailer, recording publisher. Covers the claim
//! race, the cancellation window, forced deletes, ratings and the public
//! visibility filter.

use std::collections::HashSet;
use std::sync::Arc;

use careslot_server::auth::Principal;
use careslot_server::booking::{BookingService, CANCEL_CUTOFF_HOURS};
use careslot_server::db::DbService;
use careslot_server::db::models::{
    ApprovalStatus, BookingStatus, CustomerDetails, Gender, Role, Slot, SlotCreate, User,
};
use careslot_server::db::repository::{SlotRepository, UserRepository};
use careslot_server::message::{EventTopic, RecordingPublisher};
use careslot_server::ratings::RatingService;
use careslot_server::services::NoopMailer;
use careslot_server::utils::AppError;
use chrono::{DateTime, Duration, Utc};
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

struct TestEnv {
    booking: BookingService,
    ratings: RatingService,
    publisher: Arc<RecordingPublisher>,
    db: Surreal<Db>,
}

async fn env() -> TestEnv {
    let db = DbService::memory().await.expect("in-memory db").db;
    let publisher = Arc::new(RecordingPublisher::new());
    TestEnv {
        booking: BookingService::new(db.clone(), publisher.clone(), Arc::new(NoopMailer)),
        ratings: RatingService::new(db.clone(), publisher.clone()),
        publisher,
        db,
    }
}

async fn seed_provider(env: &TestEnv, email: &str) -> Principal {
    let user = UserRepository::new(env.db.clone())
        .create(User {
            id: None,
            email: email.to_string(),
            name: "Dr Flow".to_string(),
            role: Role::Provider,
            approval_status: Some(ApprovalStatus::Approved),
            is_active: true,
        })
        .await
        .expect("seed provider");
    Principal::new(user.id.expect("user id").to_string(), email, Role::Provider)
}

async fn seed_slot(env: &TestEnv, provider: &Principal, start: DateTime<Utc>) -> Slot {
    env.booking
        .create_slot(
            provider,
            SlotCreate {
                date: start.format("%Y-%m-%d").to_string(),
                time: start.format("%H:%M:%S").to_string(),
                duration_minutes: 30,
                price: 120.0,
                department: "Cardiology".to_string(),
            },
        )
        .await
        .expect("seed slot")
}

fn customer(email: &str) -> CustomerDetails {
    CustomerDetails {
        name: "Alice Flow".to_string(),
        email: email.to_string(),
        phone: "555-0101".to_string(),
        age: 29,
        gender: Gender::Female,
    }
}

#[tokio::test]
async fn double_claim_race_has_exactly_one_winner() {
    let env = env().await;
    let provider = seed_provider(&env, "dr@flow.test").await;
    let slot = seed_slot(&env, &provider, Utc::now() + Duration::days(7)).await;
    let slot_id = slot.id.unwrap().to_string();

    let a = env.booking.clone();
    let b = env.booking.clone();
    let (id_a, id_b) = (slot_id.clone(), slot_id.clone());
    let ta = tokio::spawn(async move { a.claim(&id_a, customer("a@flow.test")).await });
    let tb = tokio::spawn(async move { b.claim(&id_b, customer("b@flow.test")).await });

    let ra = ta.await.unwrap();
    let rb = tb.await.unwrap();
    let wins = [ra.is_ok(), rb.is_ok()].iter().filter(|w| **w).count();
    assert_eq!(wins, 1, "exactly one claim must win the race");

    let loser = if ra.is_ok() { rb } else { ra };
    assert!(matches!(loser.unwrap_err(), AppError::AlreadyBooked(_)));
}

#[tokio::test]
async fn cancellation_window_boundary() {
    let env = env().await;
    let provider = seed_provider(&env, "dr@flow.test").await;
    let me = Principal::new("user:alice", "alice@flow.test", Role::Customer);

    // Just outside the cutoff: cancellation goes through
    let open = seed_slot(
        &env,
        &provider,
        Utc::now() + Duration::hours(CANCEL_CUTOFF_HOURS) + Duration::minutes(1),
    )
    .await;
    let open_id = open.id.unwrap().to_string();
    let booking = env
        .booking
        .claim(&open_id, customer("alice@flow.test"))
        .await
        .unwrap()
        .booking;
    let outcome = env
        .booking
        .cancel(&booking.id.unwrap().to_string(), &me)
        .await
        .unwrap();
    assert_eq!(outcome.booking.status, BookingStatus::Cancelled);

    // Just inside the cutoff: rejected, state untouched
    let closed = seed_slot(
        &env,
        &provider,
        Utc::now() + Duration::hours(CANCEL_CUTOFF_HOURS) - Duration::seconds(30),
    )
    .await;
    let closed_id = closed.id.unwrap().to_string();
    let booking = env
        .booking
        .claim(&closed_id, customer("alice@flow.test"))
        .await
        .unwrap()
        .booking;
    let booking_id = booking.id.unwrap().to_string();
    let err = env.booking.cancel(&booking_id, &me).await.unwrap_err();
    assert!(matches!(err, AppError::TooLate(_)));
    assert_eq!(
        env.booking.get_booking(&booking_id).await.unwrap().status,
        BookingStatus::Booked
    );
}

#[tokio::test]
async fn cancel_twice_is_a_noop_the_second_time() {
    let env = env().await;
    let provider = seed_provider(&env, "dr@flow.test").await;
    let me = Principal::new("user:alice", "alice@flow.test", Role::Customer);
    let slot = seed_slot(&env, &provider, Utc::now() + Duration::days(3)).await;
    let slot_id = slot.id.unwrap().to_string();

    let booking = env
        .booking
        .claim(&slot_id, customer("alice@flow.test"))
        .await
        .unwrap()
        .booking;
    let booking_id = booking.id.unwrap().to_string();

    let first = env.booking.cancel(&booking_id, &me).await.unwrap();
    assert!(!first.already_cancelled);
    let second = env.booking.cancel(&booking_id, &me).await.unwrap();
    assert!(second.already_cancelled);
}

#[tokio::test]
async fn booking_numbers_are_unique_and_branded() {
    let env = env().await;
    let provider = seed_provider(&env, "dr@flow.test").await;

    let mut numbers = HashSet::new();
    for i in 0..5 {
        let slot = seed_slot(
            &env,
            &provider,
            Utc::now() + Duration::days(7) + Duration::hours(i),
        )
        .await;
        let outcome = env
            .booking
            .claim(&slot.id.unwrap().to_string(), customer("alice@flow.test"))
            .await
            .unwrap();
        assert!(outcome.booking.number.starts_with("CS-"));
        assert!(
            numbers.insert(outcome.booking.number.clone()),
            "duplicate booking number allocated"
        );
    }
}

#[tokio::test]
async fn released_slot_can_be_claimed_again() {
    let env = env().await;
    let provider = seed_provider(&env, "dr@flow.test").await;
    let slot = seed_slot(&env, &provider, Utc::now() + Duration::days(3)).await;
    let slot_id = slot.id.unwrap().to_string();

    let first = env
        .booking
        .claim(&slot_id, customer("alice@flow.test"))
        .await
        .unwrap();
    let alice = Principal::new("user:alice", "alice@flow.test", Role::Customer);
    env.booking
        .cancel(&first.booking.id.unwrap().to_string(), &alice)
        .await
        .unwrap();

    // The released slot is claimable by someone else
    let second = env
        .booking
        .claim(&slot_id, customer("bob@flow.test"))
        .await
        .unwrap();
    assert_ne!(first.booking.number, second.booking.number);

    let slot = SlotRepository::new(env.db.clone())
        .find_by_id(&slot_id)
        .await
        .unwrap()
        .unwrap();
    assert!(slot.is_booked);
}

#[tokio::test]
async fn forced_delete_cancels_the_active_booking() {
    let env = env().await;
    let provider = seed_provider(&env, "dr@flow.test").await;
    let slot = seed_slot(&env, &provider, Utc::now() + Duration::days(3)).await;
    let slot_id = slot.id.unwrap().to_string();

    let claim = env
        .booking
        .claim(&slot_id, customer("alice@flow.test"))
        .await
        .unwrap();
    let booking_id = claim.booking.id.unwrap().to_string();

    assert!(matches!(
        env.booking
            .delete_slot(&slot_id, false, &provider)
            .await
            .unwrap_err(),
        AppError::Conflict(_)
    ));

    let outcome = env
        .booking
        .delete_slot(&slot_id, true, &provider)
        .await
        .unwrap();
    assert_eq!(outcome.cancelled_booking.as_deref(), Some(booking_id.as_str()));
    assert_eq!(
        env.booking.get_booking(&booking_id).await.unwrap().status,
        BookingStatus::Cancelled
    );
    // The ticket survives the forced delete
    env.booking.get_ticket(&booking_id).await.unwrap();

    let topics = env.publisher.topics();
    assert!(topics.contains(&EventTopic::SlotDeleted));
    assert!(topics.contains(&EventTopic::BookingCancelled));
}

#[tokio::test]
async fn rating_aggregate_and_write_once() {
    let env = env().await;
    let provider = seed_provider(&env, "dr@flow.test").await;
    // First slot creates the public doctor profile the ratings land on
    seed_slot(&env, &provider, Utc::now() + Duration::days(3)).await;

    let raters: Vec<Principal> = (1..=3)
        .map(|n| {
            Principal::new(
                format!("user:rater{n}"),
                format!("rater{n}@flow.test"),
                Role::Customer,
            )
        })
        .collect();

    env.ratings
        .rate(&provider.user_id, &raters[0], 3.0)
        .await
        .unwrap();
    env.ratings
        .rate(&provider.user_id, &raters[1], 4.0)
        .await
        .unwrap();
    let summary = env
        .ratings
        .rate(&provider.user_id, &raters[2], 5.0)
        .await
        .unwrap();
    assert_eq!(summary.count, 3);
    assert!((summary.average - 4.0).abs() < f64::EPSILON);

    // Write-once: a second rating from the same user conflicts
    let err = env
        .ratings
        .rate(&provider.user_id, &raters[0], 1.0)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    // New slots snapshot the recomputed aggregate
    let slot = seed_slot(&env, &provider, Utc::now() + Duration::days(4)).await;
    assert!((slot.doctor.rating - 4.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn public_listing_applies_the_visibility_filter() {
    let env = env().await;

    // Visible: approved and has a profile (created with the slot)
    let visible = seed_provider(&env, "visible@flow.test").await;
    let kept = seed_slot(&env, &visible, Utc::now() + Duration::days(3)).await;

    // Approved but never published a slot: no profile, nothing to list
    seed_provider(&env, "profileless@flow.test").await;

    // Had a profile, later rejected: slots drop out of the listing
    let rejected = seed_provider(&env, "rejected@flow.test").await;
    seed_slot(&env, &rejected, Utc::now() + Duration::days(3)).await;
    UserRepository::new(env.db.clone())
        .set_approval_status(&rejected.user_id, ApprovalStatus::Rejected)
        .await
        .unwrap();

    let slots = env.booking.list_public_slots().await.unwrap();
    assert_eq!(slots.len(), 1);
    assert_eq!(
        slots[0].id.as_ref().map(|id| id.to_string()),
        kept.id.map(|id| id.to_string())
    );
}
