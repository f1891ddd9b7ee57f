//! Doctor API handlers

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;

use crate::auth::{MaybePrincipal, Principal};
use crate::core::ServerState;
use crate::db::models::RatingSummary;
use crate::utils::{AppResponse, AppResult, ok};

#[derive(Debug, Deserialize)]
pub struct RateRequest {
    pub value: f64,
}

/// POST /api/doctors/{id}/rating - rate a doctor (write-once)
pub async fn rate(
    State(state): State<ServerState>,
    principal: Principal,
    Path(id): Path<String>,
    Json(payload): Json<RateRequest>,
) -> AppResult<Json<AppResponse<RatingSummary>>> {
    let summary = state
        .rating_service()
        .rate(&id, &principal, payload.value)
        .await?;
    Ok(ok(summary))
}

/// GET /api/doctors/{id}/rating - public aggregate, personalized when a
/// valid token is presented
pub async fn get_rating(
    State(state): State<ServerState>,
    MaybePrincipal(principal): MaybePrincipal,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<RatingSummary>>> {
    let summary = state
        .rating_service()
        .get_rating(&id, principal.as_ref())
        .await?;
    Ok(ok(summary))
}
