//! Slot API handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;

use crate::auth::Principal;
use crate::booking::SlotDeleteOutcome;
use crate::core::ServerState;
use crate::db::models::{Slot, SlotCreate};
use crate::utils::{AppResponse, AppResult, ok, ok_with_warnings};

/// GET /api/slots - public listing, visibility-filtered
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<AppResponse<Vec<Slot>>>> {
    let slots = state.booking_service().list_public_slots().await?;
    Ok(ok(slots))
}

/// POST /api/slots - publish a slot (approved providers only)
pub async fn create(
    State(state): State<ServerState>,
    principal: Principal,
    Json(payload): Json<SlotCreate>,
) -> AppResult<Json<AppResponse<Slot>>> {
    let slot = state.booking_service().create_slot(&principal, payload).await?;
    Ok(ok(slot))
}

/// GET /api/slots/mine - the calling provider's own slots
pub async fn mine(
    State(state): State<ServerState>,
    principal: Principal,
) -> AppResult<Json<AppResponse<Vec<Slot>>>> {
    let slots = state.booking_service().list_provider_slots(&principal).await?;
    Ok(ok(slots))
}

#[derive(Debug, Deserialize)]
pub struct DeleteParams {
    #[serde(default)]
    pub force: bool,
}

/// DELETE /api/slots/{id}?force= - owner or admin delete
pub async fn delete(
    State(state): State<ServerState>,
    principal: Principal,
    Path(id): Path<String>,
    Query(params): Query<DeleteParams>,
) -> AppResult<Json<AppResponse<SlotDeleteOutcome>>> {
    let mut outcome = state
        .booking_service()
        .delete_slot(&id, params.force, &principal)
        .await?;
    let warnings = std::mem::take(&mut outcome.warnings);
    Ok(ok_with_warnings(outcome, warnings))
}
