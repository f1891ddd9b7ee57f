//! Admin moderation handlers
//!
//! Thin status writes over the user table plus the matching events. The
//! admin-role gate is a route layer in `mod.rs`.

use axum::{
    Json,
    extract::{Path, State},
};

use crate::core::ServerState;
use crate::db::models::{ApprovalStatus, Role, User};
use crate::db::repository::{DoctorRepository, UserRepository};
use crate::message::{BusMessage, EventTopic};
use crate::utils::{AppError, AppResponse, AppResult, ok};

/// POST /api/admin/doctors/{id}/approve
pub async fn approve(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<User>>> {
    let user = set_status(&state, &id, ApprovalStatus::Approved).await?;
    state
        .publisher
        .publish(BusMessage::new(EventTopic::DoctorApproved, id));
    Ok(ok(user))
}

/// POST /api/admin/doctors/{id}/reject
pub async fn reject(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<User>>> {
    let user = set_status(&state, &id, ApprovalStatus::Rejected).await?;
    state
        .publisher
        .publish(BusMessage::new(EventTopic::DoctorRejected, id));
    Ok(ok(user))
}

async fn set_status(
    state: &ServerState,
    id: &str,
    status: ApprovalStatus,
) -> Result<User, AppError> {
    let users = UserRepository::new(state.db.clone());
    let user = users
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {id} not found")))?;
    if user.role != Role::Provider {
        return Err(AppError::Invalid(format!("User {id} is not a provider")));
    }
    let user = users.set_approval_status(id, status).await?;
    Ok(user)
}

/// DELETE /api/admin/users/{id}
///
/// Removes the account; a provider's public doctor profile goes with it, so
/// their remaining slots drop out of the public listing immediately.
pub async fn delete_user(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<bool>>> {
    let users = UserRepository::new(state.db.clone());
    let user = users
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {id} not found")))?;

    if user.role == Role::Provider
        && let Some(provider_record) = &user.id
    {
        DoctorRepository::new(state.db.clone())
            .delete_by_provider(provider_record)
            .await?;
    }

    users.delete(&id).await?;
    state
        .publisher
        .publish(BusMessage::new(EventTopic::UserRemoved, id));
    Ok(ok(true))
}
