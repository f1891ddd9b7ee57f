//! Ticket API handlers

use axum::{
    Json,
    extract::{Path, State},
};

use crate::auth::Principal;
use crate::core::ServerState;
use crate::db::models::Ticket;
use crate::utils::{AppError, AppResponse, AppResult, ok};

/// GET /api/tickets/{booking_id} - the ticket for a booking (owner or admin)
pub async fn get_by_booking(
    State(state): State<ServerState>,
    principal: Principal,
    Path(booking_id): Path<String>,
) -> AppResult<Json<AppResponse<Ticket>>> {
    let service = state.booking_service();
    let booking = service.get_booking(&booking_id).await?;
    if !principal.is_admin() && !booking.customer.email.eq_ignore_ascii_case(&principal.email) {
        return Err(AppError::Forbidden(
            "Booking belongs to a different customer".to_string(),
        ));
    }
    let ticket = service.get_ticket(&booking_id).await?;
    Ok(ok(ticket))
}
