//! Booking lifecycle service
//!
//! Owns the slot claim, cancellation, and deletion flows. The conditional
//! write on `slot.is_booked` is the single arbiter of who wins a claim;
//! everything after it (booking number, ticket, emails, events) either
//! retries, degrades to a warning, or rolls the claim back.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::Serialize;
use surrealdb::{RecordId, Surreal};
use surrealdb::engine::local::Db;

use super::number::{self, MAX_GENERATION_ATTEMPTS};
use crate::auth::Principal;
use crate::db::models::{
    ApprovalStatus, Booking, BookingStatus, CustomerDetails, DoctorProfile, DoctorSnapshot, Role,
    Slot, SlotCreate, Ticket,
};
use crate::db::repository::{
    BookingRepository, DoctorRepository, RepoError, SlotRepository, TicketRepository,
    UserRepository, parse_id,
};
use crate::message::{BusMessage, EventPublisher, EventTopic};
use crate::services::{Mailer, best_effort};
use crate::utils::validation::{self, validate_email, validate_required_text};
use crate::utils::{AppError, time};

/// Cancellations close this many hours before the appointment starts
pub const CANCEL_CUTOFF_HOURS: i64 = 2;

/// Result of a successful claim. A missing ticket is a degraded success,
/// not a failure; the warning explains what went wrong.
#[derive(Debug, Serialize)]
pub struct ClaimOutcome {
    pub booking: Booking,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticket: Option<Ticket>,
    #[serde(skip)]
    pub warnings: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct CancelOutcome {
    pub booking: Booking,
    /// True when the booking was already cancelled and nothing changed
    pub already_cancelled: bool,
    #[serde(skip)]
    pub warnings: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct SlotDeleteOutcome {
    pub deleted: bool,
    /// ID of the booking that was cancelled by a forced delete, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancelled_booking: Option<String>,
    #[serde(skip)]
    pub warnings: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct BookingDeleteOutcome {
    pub deleted: bool,
    pub slot_released: bool,
    #[serde(skip)]
    pub warnings: Vec<String>,
}

#[derive(Clone)]
pub struct BookingService {
    db: Surreal<Db>,
    publisher: Arc<dyn EventPublisher>,
    mailer: Arc<dyn Mailer>,
}

impl BookingService {
    pub fn new(
        db: Surreal<Db>,
        publisher: Arc<dyn EventPublisher>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        Self {
            db,
            publisher,
            mailer,
        }
    }

    /// Claim a slot for a customer.
    ///
    /// Exactly one concurrent claim per slot succeeds; the rest get
    /// [`AppError::AlreadyBooked`]. On success the booking is guaranteed; the
    /// ticket and the two emails are best-effort and surface as warnings.
    pub async fn claim(
        &self,
        slot_id: &str,
        customer: CustomerDetails,
    ) -> Result<ClaimOutcome, AppError> {
        validate_customer(&customer)?;

        let slots = SlotRepository::new(self.db.clone());
        let slot = slots
            .find_by_id(slot_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Slot {slot_id} not found")))?;
        // Fast path only; the conditional write below is the real arbiter.
        if slot.is_booked {
            return Err(AppError::AlreadyBooked(format!(
                "Slot {slot_id} is already booked"
            )));
        }

        let claimed = slots.claim_if_free(slot_id).await?.ok_or_else(|| {
            AppError::AlreadyBooked(format!("Slot {slot_id} was booked by another customer"))
        })?;
        let slot_record = claimed
            .id
            .clone()
            .ok_or_else(|| AppError::Internal("claimed slot has no record id".to_string()))?;

        let bookings = BookingRepository::new(self.db.clone());
        let mut attempts = 0;
        let booking = loop {
            attempts += 1;
            let candidate = Booking {
                id: None,
                slot: slot_record.clone(),
                number: number::generate(),
                customer: customer.clone(),
                doctor: claimed.doctor.clone(),
                fee: claimed.price,
                status: BookingStatus::Booked,
            };
            match bookings.create(candidate).await {
                Ok(created) => break created,
                Err(RepoError::Duplicate(_)) if attempts < MAX_GENERATION_ATTEMPTS => {
                    tracing::debug!(attempts, "booking number collision, regenerating");
                }
                Err(e) => {
                    // Undo the claim so a failed insert does not wedge the slot.
                    if let Err(release_err) = slots.release(slot_id).await {
                        tracing::error!(
                            slot = slot_id,
                            error = %release_err,
                            "failed to release slot after booking insert failure"
                        );
                    }
                    return Err(match e {
                        RepoError::Duplicate(_) => AppError::Internal(
                            "Could not allocate a unique booking number".to_string(),
                        ),
                        other => other.into(),
                    });
                }
            }
        };
        let booking_record = booking
            .id
            .clone()
            .ok_or_else(|| AppError::Internal("created booking has no record id".to_string()))?;

        let mut warnings = Vec::new();

        // Ticket failure is tolerated: the booking stands without it.
        let ticket = Ticket {
            id: None,
            booking: booking_record.clone(),
            booking_number: booking.number.clone(),
            customer_name: customer.name.clone(),
            customer_email: customer.email.clone(),
            doctor: claimed.doctor.clone(),
            fee: claimed.price,
            date: claimed.date.clone(),
            time: claimed.time.clone(),
            department: claimed.department.clone(),
        };
        let ticket = match TicketRepository::new(self.db.clone()).create(ticket).await {
            Ok(created) => Some(created),
            Err(e) => {
                tracing::warn!(booking = %booking_record, error = %e, "ticket creation failed");
                warnings.push(format!("ticket creation failed: {e}"));
                None
            }
        };

        self.publisher.publish(
            BusMessage::new(EventTopic::SlotUpdated, slot_record.to_string())
                .with_data(&serde_json::json!({ "is_booked": true })),
        );
        self.publisher.publish(
            BusMessage::new(EventTopic::BookingCreated, booking_record.to_string())
                .with_data(&booking),
        );
        if let Some(t) = &ticket
            && let Some(ticket_record) = &t.id
        {
            self.publisher
                .publish(BusMessage::new(EventTopic::TicketCreated, ticket_record.to_string()));
        }

        if let Some(w) = best_effort(
            "confirmation email",
            self.mailer.booking_confirmation(&customer.email, &booking.number),
        )
        .await
        {
            warnings.push(w);
        }
        if let Some(w) = best_effort(
            "provider notification email",
            self.mailer
                .provider_new_booking(&claimed.doctor.contact_email, &booking.number),
        )
        .await
        {
            warnings.push(w);
        }

        Ok(ClaimOutcome {
            booking,
            ticket,
            warnings,
        })
    }

    /// Cancel a booking, subject to the cutoff window.
    ///
    /// Cancelling an already-cancelled booking is a no-op success. An active
    /// booking whose slot record is missing cannot be cancelled through this
    /// path and reports the missing slot.
    pub async fn cancel(
        &self,
        booking_id: &str,
        principal: &Principal,
    ) -> Result<CancelOutcome, AppError> {
        let bookings = BookingRepository::new(self.db.clone());
        let booking = bookings
            .find_by_id(booking_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Booking {booking_id} not found")))?;

        if !principal.is_admin() && !booking.customer.email.eq_ignore_ascii_case(&principal.email)
        {
            return Err(AppError::Forbidden(
                "Booking belongs to a different customer".to_string(),
            ));
        }

        if booking.status == BookingStatus::Cancelled {
            return Ok(CancelOutcome {
                booking,
                already_cancelled: true,
                warnings: Vec::new(),
            });
        }

        let slots = SlotRepository::new(self.db.clone());
        let slot_id = booking.slot.to_string();
        let slot = slots
            .find_by_id(&slot_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Slot {slot_id} not found")))?;

        let start = time::slot_start_instant(&slot.date, &slot.time)?;
        if Utc::now() > start - Duration::hours(CANCEL_CUTOFF_HOURS) {
            return Err(AppError::TooLate(format!(
                "Cancellation closes {CANCEL_CUTOFF_HOURS} hours before the appointment"
            )));
        }

        bookings
            .set_status(booking_id, BookingStatus::Cancelled)
            .await?;
        if slot.is_booked {
            slots.release(&slot_id).await?;
            self.publisher.publish(
                BusMessage::new(EventTopic::SlotUpdated, slot_id.clone())
                    .with_data(&serde_json::json!({ "is_booked": false })),
            );
        }

        let mut warnings = Vec::new();
        if let Some(w) = best_effort(
            "cancellation email",
            self.mailer
                .booking_cancelled(&booking.customer.email, &booking.number),
        )
        .await
        {
            warnings.push(w);
        }
        self.publisher
            .publish(BusMessage::new(EventTopic::BookingCancelled, booking_id.to_string()));

        let booking = Booking {
            status: BookingStatus::Cancelled,
            ..booking
        };
        Ok(CancelOutcome {
            booking,
            already_cancelled: false,
            warnings,
        })
    }

    /// Delete a slot. A slot with an active booking is only deleted with
    /// `force`, which cancels the booking (ignoring the cutoff) and notifies
    /// the customer.
    pub async fn delete_slot(
        &self,
        slot_id: &str,
        force: bool,
        principal: &Principal,
    ) -> Result<SlotDeleteOutcome, AppError> {
        let slots = SlotRepository::new(self.db.clone());
        let slot = slots
            .find_by_id(slot_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Slot {slot_id} not found")))?;
        let slot_record = slot
            .id
            .clone()
            .ok_or_else(|| AppError::Internal("slot has no record id".to_string()))?;

        if !principal.is_admin() && slot.provider.to_string() != principal.user_id {
            return Err(AppError::Forbidden(
                "Slot belongs to a different provider".to_string(),
            ));
        }

        let mut warnings = Vec::new();
        let mut cancelled_booking = None;
        if slot.is_booked {
            if !force {
                return Err(AppError::Conflict(format!(
                    "Slot {slot_id} has an active booking; pass force=true to delete it anyway"
                )));
            }
            let bookings = BookingRepository::new(self.db.clone());
            if let Some(active) = bookings.find_active_by_slot(&slot_record).await? {
                let booking_id = active
                    .id
                    .clone()
                    .ok_or_else(|| AppError::Internal("booking has no record id".to_string()))?
                    .to_string();
                bookings
                    .set_status(&booking_id, BookingStatus::Cancelled)
                    .await?;
                if let Some(w) = best_effort(
                    "cancellation email",
                    self.mailer
                        .booking_cancelled(&active.customer.email, &active.number),
                )
                .await
                {
                    warnings.push(w);
                }
                self.publisher
                    .publish(BusMessage::new(EventTopic::BookingCancelled, booking_id.clone()));
                cancelled_booking = Some(booking_id);
            }
        }

        slots.delete(slot_id).await?;
        self.publisher
            .publish(BusMessage::new(EventTopic::SlotDeleted, slot_record.to_string()));

        Ok(SlotDeleteOutcome {
            deleted: true,
            cancelled_booking,
            warnings,
        })
    }

    /// Hard delete a booking (admin cleanup). Releases the slot if the
    /// booking was still active. The ticket is deliberately left in place.
    pub async fn delete_booking(
        &self,
        booking_id: &str,
    ) -> Result<BookingDeleteOutcome, AppError> {
        let bookings = BookingRepository::new(self.db.clone());
        let booking = bookings
            .find_by_id(booking_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Booking {booking_id} not found")))?;

        let slots = SlotRepository::new(self.db.clone());
        let slot_id = booking.slot.to_string();
        let mut slot_released = false;
        if booking.status == BookingStatus::Booked
            && let Some(slot) = slots.find_by_id(&slot_id).await?
            && slot.is_booked
        {
            slots.release(&slot_id).await?;
            slot_released = true;
            self.publisher.publish(
                BusMessage::new(EventTopic::SlotUpdated, slot_id.clone())
                    .with_data(&serde_json::json!({ "is_booked": false })),
            );
        }

        bookings.delete(booking_id).await?;

        let mut warnings = Vec::new();
        if booking.status == BookingStatus::Booked
            && let Some(w) = best_effort(
                "cancellation email",
                self.mailer
                    .booking_cancelled(&booking.customer.email, &booking.number),
            )
            .await
        {
            warnings.push(w);
        }
        self.publisher
            .publish(BusMessage::new(EventTopic::BookingCancelled, booking_id.to_string()));

        Ok(BookingDeleteOutcome {
            deleted: true,
            slot_released,
            warnings,
        })
    }

    /// Fetch a booking by id
    pub async fn get_booking(&self, booking_id: &str) -> Result<Booking, AppError> {
        let booking = BookingRepository::new(self.db.clone())
            .find_by_id(booking_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Booking {booking_id} not found")))?;
        Ok(booking)
    }

    /// Fetch the ticket attached to a booking
    pub async fn get_ticket(&self, booking_id: &str) -> Result<Ticket, AppError> {
        let booking = self.get_booking(booking_id).await?;
        let booking_record = booking
            .id
            .ok_or_else(|| AppError::Internal("booking has no record id".to_string()))?;
        TicketRepository::new(self.db.clone())
            .find_by_booking(&booking_record)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("No ticket for booking {booking_id}")))
    }

    /// Public slot listing.
    ///
    /// A provider's slots are visible only when the account is approved and
    /// active AND a public doctor profile exists; the visible set is the
    /// intersection of the two.
    pub async fn list_public_slots(&self) -> Result<Vec<Slot>, AppError> {
        let approved = UserRepository::new(self.db.clone())
            .approved_active_provider_ids()
            .await?;
        let with_profile: HashSet<String> = DoctorRepository::new(self.db.clone())
            .provider_ids_with_profile()
            .await?
            .into_iter()
            .map(|id| id.to_string())
            .collect();
        let visible: Vec<RecordId> = approved
            .into_iter()
            .filter(|id| with_profile.contains(&id.to_string()))
            .collect();
        if visible.is_empty() {
            return Ok(Vec::new());
        }
        let slots = SlotRepository::new(self.db.clone())
            .find_visible(visible)
            .await?;
        Ok(slots)
    }

    /// The calling provider's own slots
    pub async fn list_provider_slots(&self, principal: &Principal) -> Result<Vec<Slot>, AppError> {
        let provider = parse_id(&principal.user_id)?;
        let slots = SlotRepository::new(self.db.clone())
            .find_by_provider(&provider)
            .await?;
        Ok(slots)
    }

    /// Publish a new slot. Only approved, active providers may publish; the
    /// public doctor profile is created lazily on the first slot.
    pub async fn create_slot(
        &self,
        principal: &Principal,
        payload: SlotCreate,
    ) -> Result<Slot, AppError> {
        let user = UserRepository::new(self.db.clone())
            .find_by_id(&principal.user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", principal.user_id)))?;
        let provider_record = user
            .id
            .clone()
            .ok_or_else(|| AppError::Internal("user has no record id".to_string()))?;

        if user.role != Role::Provider {
            return Err(AppError::Forbidden(
                "Only providers can publish slots".to_string(),
            ));
        }
        if user.approval_status != Some(ApprovalStatus::Approved) || !user.is_active {
            return Err(AppError::Forbidden(
                "Provider account is not approved and active".to_string(),
            ));
        }

        // Reject unparsable schedules up front, not at cancellation time,
        // and store the canonical zero-padded form so the listing sort holds.
        let (date, time) = time::normalize_schedule(&payload.date, &payload.time)?;
        validate_required_text(&payload.department, "department", validation::MAX_NAME_LEN)?;
        if payload.duration_minutes <= 0 {
            return Err(AppError::Validation(
                "duration_minutes must be positive".to_string(),
            ));
        }
        if payload.price < 0.0 {
            return Err(AppError::Validation(
                "price must not be negative".to_string(),
            ));
        }

        let profile = DoctorRepository::new(self.db.clone())
            .create_if_missing(DoctorProfile {
                id: None,
                provider: provider_record.clone(),
                name: user.name.clone(),
                speciality: payload.department.clone(),
                location: String::new(),
                contact_email: user.email.clone(),
                rating_avg: 0.0,
                rating_count: 0,
            })
            .await?;

        let slot = Slot {
            id: None,
            provider: provider_record,
            date,
            time,
            duration_minutes: payload.duration_minutes,
            price: payload.price,
            department: payload.department,
            doctor: DoctorSnapshot {
                name: profile.name.clone(),
                location: profile.location.clone(),
                rating: profile.rating_avg,
                contact_email: profile.contact_email.clone(),
            },
            is_booked: false,
        };
        let created = SlotRepository::new(self.db.clone()).create(slot).await?;
        if let Some(slot_record) = &created.id {
            self.publisher.publish(
                BusMessage::new(EventTopic::SlotCreated, slot_record.to_string())
                    .with_data(&created),
            );
        }
        Ok(created)
    }
}

fn validate_customer(customer: &CustomerDetails) -> Result<(), AppError> {
    validate_required_text(&customer.name, "name", validation::MAX_NAME_LEN)?;
    validate_email(&customer.email, "email")?;
    validate_required_text(&customer.phone, "phone", validation::MAX_SHORT_TEXT_LEN)?;
    if !(1..=120).contains(&customer.age) {
        return Err(AppError::Validation(
            "age must be between 1 and 120".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbService;
    use crate::db::models::{Gender, User};
    use crate::message::RecordingPublisher;
    use crate::services::NoopMailer;
    use chrono::DateTime;

    async fn service() -> (BookingService, Arc<RecordingPublisher>) {
        let db = DbService::memory().await.expect("in-memory db").db;
        let publisher = Arc::new(RecordingPublisher::new());
        let svc = BookingService::new(db, publisher.clone(), Arc::new(NoopMailer));
        (svc, publisher)
    }

    async fn seed_provider(svc: &BookingService, email: &str) -> Principal {
        let user = UserRepository::new(svc.db.clone())
            .create(User {
                id: None,
                email: email.to_string(),
                name: "Dr Seed".to_string(),
                role: Role::Provider,
                approval_status: Some(ApprovalStatus::Approved),
                is_active: true,
            })
            .await
            .expect("seed provider");
        Principal::new(user.id.expect("user id").to_string(), email, Role::Provider)
    }

    async fn seed_slot(
        svc: &BookingService,
        provider: &Principal,
        start: DateTime<Utc>,
    ) -> Slot {
        svc.create_slot(
            provider,
            SlotCreate {
                date: start.format("%Y-%m-%d").to_string(),
                time: start.format("%H:%M:%S").to_string(),
                duration_minutes: 30,
                price: 80.0,
                department: "Cardiology".to_string(),
            },
        )
        .await
        .expect("seed slot")
    }

    fn customer() -> CustomerDetails {
        CustomerDetails {
            name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
            phone: "555-0101".to_string(),
            age: 34,
            gender: Gender::Female,
        }
    }

    fn customer_principal() -> Principal {
        Principal::new("user:alice", "alice@example.com", Role::Customer)
    }

    #[tokio::test]
    async fn claim_creates_booking_and_ticket() {
        let (svc, publisher) = service().await;
        let provider = seed_provider(&svc, "dr@clinic.test").await;
        let slot = seed_slot(&svc, &provider, Utc::now() + Duration::days(7)).await;
        let slot_id = slot.id.unwrap().to_string();

        let outcome = svc.claim(&slot_id, customer()).await.unwrap();
        assert!(outcome.booking.number.starts_with(number::BOOKING_NUMBER_PREFIX));
        assert_eq!(outcome.booking.status, BookingStatus::Booked);
        assert_eq!(outcome.booking.fee, 80.0);
        let ticket = outcome.ticket.expect("ticket created");
        assert_eq!(ticket.booking_number, outcome.booking.number);
        assert_eq!(ticket.customer_email, "alice@example.com");
        assert!(outcome.warnings.is_empty());

        let slot = SlotRepository::new(svc.db.clone())
            .find_by_id(&slot_id)
            .await
            .unwrap()
            .unwrap();
        assert!(slot.is_booked);

        let topics = publisher.topics();
        assert!(topics.contains(&EventTopic::SlotUpdated));
        assert!(topics.contains(&EventTopic::BookingCreated));
        assert!(topics.contains(&EventTopic::TicketCreated));
    }

    #[tokio::test]
    async fn claim_unknown_slot_is_not_found() {
        let (svc, _) = service().await;
        let err = svc.claim("slot:missing", customer()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn second_claim_is_rejected() {
        let (svc, _) = service().await;
        let provider = seed_provider(&svc, "dr@clinic.test").await;
        let slot = seed_slot(&svc, &provider, Utc::now() + Duration::days(7)).await;
        let slot_id = slot.id.unwrap().to_string();

        svc.claim(&slot_id, customer()).await.unwrap();
        let err = svc.claim(&slot_id, customer()).await.unwrap_err();
        assert!(matches!(err, AppError::AlreadyBooked(_)));
    }

    #[tokio::test]
    async fn concurrent_claims_have_one_winner() {
        let (svc, _) = service().await;
        let provider = seed_provider(&svc, "dr@clinic.test").await;
        let slot = seed_slot(&svc, &provider, Utc::now() + Duration::days(7)).await;
        let slot_id = slot.id.unwrap().to_string();

        let a = svc.clone();
        let b = svc.clone();
        let (ra, rb) = tokio::join!(a.claim(&slot_id, customer()), b.claim(&slot_id, customer()));
        let wins = [ra.is_ok(), rb.is_ok()].iter().filter(|w| **w).count();
        assert_eq!(wins, 1, "exactly one concurrent claim must win");
    }

    #[tokio::test]
    async fn claim_rejects_bad_customer_details() {
        let (svc, _) = service().await;
        let provider = seed_provider(&svc, "dr@clinic.test").await;
        let slot = seed_slot(&svc, &provider, Utc::now() + Duration::days(7)).await;
        let slot_id = slot.id.unwrap().to_string();

        let mut bad = customer();
        bad.name = "  ".to_string();
        assert!(matches!(
            svc.claim(&slot_id, bad).await.unwrap_err(),
            AppError::Validation(_)
        ));

        let mut bad = customer();
        bad.email = "not-an-email".to_string();
        assert!(matches!(
            svc.claim(&slot_id, bad).await.unwrap_err(),
            AppError::Validation(_)
        ));

        // Failed validation must not have consumed the slot
        let slot = SlotRepository::new(svc.db.clone())
            .find_by_id(&slot_id)
            .await
            .unwrap()
            .unwrap();
        assert!(!slot.is_booked);
    }

    #[tokio::test]
    async fn cancel_inside_window_releases_slot() {
        let (svc, publisher) = service().await;
        let provider = seed_provider(&svc, "dr@clinic.test").await;
        let slot = seed_slot(&svc, &provider, Utc::now() + Duration::hours(3)).await;
        let slot_id = slot.id.unwrap().to_string();

        let claim = svc.claim(&slot_id, customer()).await.unwrap();
        let booking_id = claim.booking.id.unwrap().to_string();

        let outcome = svc.cancel(&booking_id, &customer_principal()).await.unwrap();
        assert!(!outcome.already_cancelled);
        assert_eq!(outcome.booking.status, BookingStatus::Cancelled);

        let slot = SlotRepository::new(svc.db.clone())
            .find_by_id(&slot_id)
            .await
            .unwrap()
            .unwrap();
        assert!(!slot.is_booked, "cancellation must release the slot");
        assert!(publisher.topics().contains(&EventTopic::BookingCancelled));
    }

    #[tokio::test]
    async fn cancel_after_cutoff_is_rejected() {
        let (svc, _) = service().await;
        let provider = seed_provider(&svc, "dr@clinic.test").await;
        // 30 seconds inside the cutoff
        let start = Utc::now() + Duration::hours(CANCEL_CUTOFF_HOURS) - Duration::seconds(30);
        let slot = seed_slot(&svc, &provider, start).await;
        let slot_id = slot.id.unwrap().to_string();

        let claim = svc.claim(&slot_id, customer()).await.unwrap();
        let booking_id = claim.booking.id.unwrap().to_string();

        let err = svc
            .cancel(&booking_id, &customer_principal())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::TooLate(_)));

        // Nothing changed
        let booking = svc.get_booking(&booking_id).await.unwrap();
        assert_eq!(booking.status, BookingStatus::Booked);
        let slot = SlotRepository::new(svc.db.clone())
            .find_by_id(&slot_id)
            .await
            .unwrap()
            .unwrap();
        assert!(slot.is_booked);
    }

    #[tokio::test]
    async fn cancel_just_outside_cutoff_succeeds() {
        let (svc, _) = service().await;
        let provider = seed_provider(&svc, "dr@clinic.test").await;
        // A minute of headroom outside the cutoff
        let start = Utc::now() + Duration::hours(CANCEL_CUTOFF_HOURS) + Duration::minutes(1);
        let slot = seed_slot(&svc, &provider, start).await;
        let slot_id = slot.id.unwrap().to_string();

        let claim = svc.claim(&slot_id, customer()).await.unwrap();
        let booking_id = claim.booking.id.unwrap().to_string();

        let outcome = svc.cancel(&booking_id, &customer_principal()).await.unwrap();
        assert!(!outcome.already_cancelled);
    }

    #[tokio::test]
    async fn cancel_is_idempotent() {
        let (svc, _) = service().await;
        let provider = seed_provider(&svc, "dr@clinic.test").await;
        let slot = seed_slot(&svc, &provider, Utc::now() + Duration::days(7)).await;
        let slot_id = slot.id.unwrap().to_string();

        let claim = svc.claim(&slot_id, customer()).await.unwrap();
        let booking_id = claim.booking.id.unwrap().to_string();

        svc.cancel(&booking_id, &customer_principal()).await.unwrap();
        let second = svc.cancel(&booking_id, &customer_principal()).await.unwrap();
        assert!(second.already_cancelled);
        assert_eq!(second.booking.status, BookingStatus::Cancelled);
    }

    #[tokio::test]
    async fn cancel_with_missing_slot_is_not_found() {
        let (svc, _) = service().await;
        let provider = seed_provider(&svc, "dr@clinic.test").await;
        let slot = seed_slot(&svc, &provider, Utc::now() + Duration::days(7)).await;
        let slot_id = slot.id.unwrap().to_string();

        let claim = svc.claim(&slot_id, customer()).await.unwrap();
        let booking_id = claim.booking.id.unwrap().to_string();

        SlotRepository::new(svc.db.clone())
            .delete(&slot_id)
            .await
            .unwrap();

        let err = svc
            .cancel(&booking_id, &customer_principal())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        // The booking is untouched
        let booking = svc.get_booking(&booking_id).await.unwrap();
        assert_eq!(booking.status, BookingStatus::Booked);
    }

    #[tokio::test]
    async fn cancel_foreign_booking_is_forbidden() {
        let (svc, _) = service().await;
        let provider = seed_provider(&svc, "dr@clinic.test").await;
        let slot = seed_slot(&svc, &provider, Utc::now() + Duration::days(7)).await;
        let slot_id = slot.id.unwrap().to_string();

        let claim = svc.claim(&slot_id, customer()).await.unwrap();
        let booking_id = claim.booking.id.unwrap().to_string();

        let stranger = Principal::new("user:mallory", "mallory@example.com", Role::Customer);
        let err = svc.cancel(&booking_id, &stranger).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        // Admins may cancel on the customer's behalf
        let admin = Principal::new("user:admin", "admin@careslot.test", Role::Admin);
        svc.cancel(&booking_id, &admin).await.unwrap();
    }

    #[tokio::test]
    async fn delete_booked_slot_requires_force() {
        let (svc, _) = service().await;
        let provider = seed_provider(&svc, "dr@clinic.test").await;
        let slot = seed_slot(&svc, &provider, Utc::now() + Duration::days(7)).await;
        let slot_id = slot.id.unwrap().to_string();

        let claim = svc.claim(&slot_id, customer()).await.unwrap();
        let booking_id = claim.booking.id.unwrap().to_string();

        let err = svc
            .delete_slot(&slot_id, false, &provider)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let outcome = svc.delete_slot(&slot_id, true, &provider).await.unwrap();
        assert!(outcome.deleted);
        assert_eq!(outcome.cancelled_booking.as_deref(), Some(booking_id.as_str()));

        assert!(
            SlotRepository::new(svc.db.clone())
                .find_by_id(&slot_id)
                .await
                .unwrap()
                .is_none()
        );
        let booking = svc.get_booking(&booking_id).await.unwrap();
        assert_eq!(booking.status, BookingStatus::Cancelled);
        // The ticket outlives the forced delete
        svc.get_ticket(&booking_id).await.unwrap();
    }

    #[tokio::test]
    async fn delete_slot_of_other_provider_is_forbidden() {
        let (svc, _) = service().await;
        let provider = seed_provider(&svc, "dr@clinic.test").await;
        let other = seed_provider(&svc, "other@clinic.test").await;
        let slot = seed_slot(&svc, &provider, Utc::now() + Duration::days(7)).await;
        let slot_id = slot.id.unwrap().to_string();

        let err = svc.delete_slot(&slot_id, false, &other).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn delete_booking_releases_slot_and_keeps_ticket() {
        let (svc, _) = service().await;
        let provider = seed_provider(&svc, "dr@clinic.test").await;
        let slot = seed_slot(&svc, &provider, Utc::now() + Duration::days(7)).await;
        let slot_id = slot.id.unwrap().to_string();

        let claim = svc.claim(&slot_id, customer()).await.unwrap();
        let booking_id = claim.booking.id.unwrap().to_string();
        let ticket_booking = claim.ticket.unwrap().booking.to_string();
        assert_eq!(ticket_booking, booking_id);

        let outcome = svc.delete_booking(&booking_id).await.unwrap();
        assert!(outcome.deleted);
        assert!(outcome.slot_released);

        assert!(matches!(
            svc.get_booking(&booking_id).await.unwrap_err(),
            AppError::NotFound(_)
        ));
        let slot = SlotRepository::new(svc.db.clone())
            .find_by_id(&slot_id)
            .await
            .unwrap()
            .unwrap();
        assert!(!slot.is_booked);
        // Ticket record remains even though its booking is gone
        let tickets = TicketRepository::new(svc.db.clone());
        let booking_record: RecordId = booking_id.parse().unwrap();
        assert!(tickets.find_by_booking(&booking_record).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn listing_hides_unapproved_providers() {
        let (svc, _) = service().await;
        let approved = seed_provider(&svc, "approved@clinic.test").await;
        let revoked = seed_provider(&svc, "revoked@clinic.test").await;
        let kept = seed_slot(&svc, &approved, Utc::now() + Duration::days(7)).await;
        seed_slot(&svc, &revoked, Utc::now() + Duration::days(7)).await;

        UserRepository::new(svc.db.clone())
            .set_approval_status(&revoked.user_id, ApprovalStatus::Rejected)
            .await
            .unwrap();

        let slots = svc.list_public_slots().await.unwrap();
        assert_eq!(slots.len(), 1);
        assert_eq!(
            slots[0].id.as_ref().map(|id| id.to_string()),
            kept.id.map(|id| id.to_string())
        );
    }

    #[tokio::test]
    async fn listing_requires_doctor_profile() {
        let (svc, _) = service().await;
        // Approved provider, but no profile: never created a slot
        seed_provider(&svc, "profileless@clinic.test").await;
        let publishing = seed_provider(&svc, "publishing@clinic.test").await;
        seed_slot(&svc, &publishing, Utc::now() + Duration::days(7)).await;

        let slots = svc.list_public_slots().await.unwrap();
        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].provider.to_string(), publishing.user_id);
    }

    #[tokio::test]
    async fn create_slot_gated_on_approval() {
        let (svc, _) = service().await;
        let pending = UserRepository::new(svc.db.clone())
            .create(User {
                id: None,
                email: "pending@clinic.test".to_string(),
                name: "Dr Pending".to_string(),
                role: Role::Provider,
                approval_status: Some(ApprovalStatus::Pending),
                is_active: true,
            })
            .await
            .unwrap();
        let principal = Principal::new(
            pending.id.unwrap().to_string(),
            "pending@clinic.test",
            Role::Provider,
        );

        let err = svc
            .create_slot(
                &principal,
                SlotCreate {
                    date: "2027-01-15".to_string(),
                    time: "09:00".to_string(),
                    duration_minutes: 30,
                    price: 50.0,
                    department: "Dermatology".to_string(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn create_slot_stores_canonical_schedule() {
        let (svc, _) = service().await;
        let provider = seed_provider(&svc, "dr@clinic.test").await;

        let early = svc
            .create_slot(
                &provider,
                SlotCreate {
                    date: "2027-1-5".to_string(),
                    time: "9:00".to_string(),
                    duration_minutes: 30,
                    price: 50.0,
                    department: "Dermatology".to_string(),
                },
            )
            .await
            .unwrap();
        assert_eq!(early.date, "2027-01-05");
        assert_eq!(early.time, "09:00");

        svc.create_slot(
            &provider,
            SlotCreate {
                date: "2027-01-05".to_string(),
                time: "10:00".to_string(),
                duration_minutes: 30,
                price: 50.0,
                department: "Dermatology".to_string(),
            },
        )
        .await
        .unwrap();

        // Zero-padded storage keeps the listing in chronological order
        let listed = svc.list_public_slots().await.unwrap();
        let times: Vec<&str> = listed.iter().map(|s| s.time.as_str()).collect();
        assert_eq!(times, ["09:00", "10:00"]);
    }

    #[tokio::test]
    async fn provider_slot_listing_is_scoped_to_the_caller() {
        let (svc, _) = service().await;
        let owner = seed_provider(&svc, "owner@clinic.test").await;
        let other = seed_provider(&svc, "other@clinic.test").await;
        let mine = seed_slot(&svc, &owner, Utc::now() + Duration::days(3)).await;
        seed_slot(&svc, &other, Utc::now() + Duration::days(3)).await;

        let slots = svc.list_provider_slots(&owner).await.unwrap();
        assert_eq!(slots.len(), 1);
        assert_eq!(
            slots[0].id.as_ref().map(|id| id.to_string()),
            mine.id.map(|id| id.to_string())
        );
    }

    #[tokio::test]
    async fn create_slot_rejects_bad_schedule() {
        let (svc, _) = service().await;
        let provider = seed_provider(&svc, "dr@clinic.test").await;
        let err = svc
            .create_slot(
                &provider,
                SlotCreate {
                    date: "15/01/2027".to_string(),
                    time: "09:00".to_string(),
                    duration_minutes: 30,
                    price: 50.0,
                    department: "Dermatology".to_string(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidSlotTime(_)));
    }
}
