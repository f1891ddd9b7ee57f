//! Admin moderation API module

mod handler;

use axum::{
    Router, middleware,
    routing::{delete, post},
};

use crate::auth::require_admin;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/admin", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/doctors/{id}/approve", post(handler::approve))
        .route("/doctors/{id}/reject", post(handler::reject))
        .route("/users/{id}", delete(handler::delete_user))
        .layer(middleware::from_fn(require_admin))
}
