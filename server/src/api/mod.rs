//! HTTP API
//!
//! One router per resource under `api/<resource>/{mod,handler}.rs`, merged
//! by [`build_router`] and wrapped with the middleware stack in
//! [`build_app`].

pub mod admin;
pub mod bookings;
pub mod doctors;
pub mod health;
pub mod rate_limit;
pub mod slots;
pub mod tickets;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use http::{HeaderName, HeaderValue};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{
    MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::core::ServerState;
use self::rate_limit::RateLimiter;

/// Request ID generator
#[derive(Clone)]
struct XRequestId;

impl MakeRequestId for XRequestId {
    fn make_request_id<B>(&mut self, _request: &http::Request<B>) -> Option<RequestId> {
        let id = Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// Build a router with all routes registered (no middleware)
pub fn build_router(limiter: Arc<RateLimiter>) -> Router<ServerState> {
    Router::new()
        .merge(slots::router())
        .merge(bookings::router(limiter))
        .merge(tickets::router())
        .merge(doctors::router())
        .merge(admin::router())
        .merge(health::router())
}

/// Build the fully configured application with middleware and state
pub fn build_app(state: ServerState) -> Router {
    let limiter = Arc::new(RateLimiter::new(
        Duration::from_secs(state.config.rate_limit_window_secs),
        state.config.rate_limit_max_requests,
    ));

    build_router(limiter)
        // CORS - handle cross-origin requests
        .layer(CorsLayer::permissive())
        // Gzip compress responses
        .layer(CompressionLayer::new())
        // Request tracing
        .layer(TraceLayer::new_for_http())
        // Unique ID per request, propagated to the response
        .layer(SetRequestIdLayer::new(
            HeaderName::from_static("x-request-id"),
            XRequestId,
        ))
        .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
            "x-request-id",
        )))
        // JWT authentication - injects Principal before routes run
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            crate::auth::require_auth,
        ))
        .with_state(state)
}
