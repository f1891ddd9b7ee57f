//! Booking API handlers

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;

use crate::auth::Principal;
use crate::booking::{BookingDeleteOutcome, CancelOutcome, ClaimOutcome};
use crate::core::ServerState;
use crate::db::models::{Booking, CustomerDetails};
use crate::utils::{AppError, AppResponse, AppResult, ok, ok_with_warnings};

#[derive(Debug, Deserialize)]
pub struct ClaimRequest {
    pub slot_id: String,
    pub customer: CustomerDetails,
}

/// POST /api/bookings/claim - claim a slot (rate limited)
pub async fn claim(
    State(state): State<ServerState>,
    Json(payload): Json<ClaimRequest>,
) -> AppResult<Json<AppResponse<ClaimOutcome>>> {
    let mut outcome = state
        .booking_service()
        .claim(&payload.slot_id, payload.customer)
        .await?;
    let warnings = std::mem::take(&mut outcome.warnings);
    Ok(ok_with_warnings(outcome, warnings))
}

/// POST /api/bookings/{id}/cancel - customer cancel within the window
pub async fn cancel(
    State(state): State<ServerState>,
    principal: Principal,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<CancelOutcome>>> {
    let mut outcome = state.booking_service().cancel(&id, &principal).await?;
    let warnings = std::mem::take(&mut outcome.warnings);
    Ok(ok_with_warnings(outcome, warnings))
}

/// GET /api/bookings/{id} - owner or admin read
pub async fn get_by_id(
    State(state): State<ServerState>,
    principal: Principal,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<Booking>>> {
    let booking = state.booking_service().get_booking(&id).await?;
    if !principal.is_admin() && !booking.customer.email.eq_ignore_ascii_case(&principal.email) {
        return Err(AppError::Forbidden(
            "Booking belongs to a different customer".to_string(),
        ));
    }
    Ok(ok(booking))
}

/// DELETE /api/bookings/{id} - admin hard delete
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<BookingDeleteOutcome>>> {
    let mut outcome = state.booking_service().delete_booking(&id).await?;
    let warnings = std::mem::take(&mut outcome.warnings);
    Ok(ok_with_warnings(outcome, warnings))
}
