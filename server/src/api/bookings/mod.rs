//! Booking API module

mod handler;

use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{delete, get, post},
};

use crate::api::rate_limit::{self, RateLimiter};
use crate::auth::require_admin;
use crate::core::ServerState;

pub fn router(limiter: Arc<RateLimiter>) -> Router<ServerState> {
    Router::new().nest("/api/bookings", routes(limiter))
}

fn routes(limiter: Arc<RateLimiter>) -> Router<ServerState> {
    let claim = Router::new()
        .route("/claim", post(handler::claim))
        .layer(middleware::from_fn_with_state(limiter, rate_limit::limit));

    let admin = Router::new()
        .route("/{id}", delete(handler::delete))
        .layer(middleware::from_fn(require_admin));

    Router::new()
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/cancel", post(handler::cancel))
        .merge(claim)
        .merge(admin)
}
