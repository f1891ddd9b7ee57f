//! Doctor API module

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().route(
        "/api/doctors/{id}/rating",
        get(handler::get_rating).post(handler::rate),
    )
}
