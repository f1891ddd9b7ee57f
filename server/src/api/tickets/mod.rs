//! Ticket API module

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().route("/api/tickets/{booking_id}", get(handler::get_by_booking))
}
