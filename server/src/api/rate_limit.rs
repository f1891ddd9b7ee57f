//! Fixed-window rate limiter
//!
//! In-memory counters per client key, reset when the window rolls over.
//! Applied to the claim route only; single-process scope is fine for an
//! embedded deployment.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use dashmap::DashMap;

use crate::auth::Principal;
use crate::utils::AppError;

#[derive(Debug)]
pub struct RateLimiter {
    window: Duration,
    max_requests: u32,
    counters: DashMap<String, (Instant, u32)>,
}

impl RateLimiter {
    pub fn new(window: Duration, max_requests: u32) -> Self {
        Self {
            window,
            max_requests,
            counters: DashMap::new(),
        }
    }

    /// Count a hit for `key`; returns false once the window budget is spent.
    pub fn check(&self, key: &str) -> bool {
        let now = Instant::now();
        let mut entry = self
            .counters
            .entry(key.to_string())
            .or_insert((now, 0));
        let (start, count) = *entry;
        if now.duration_since(start) >= self.window {
            *entry = (now, 1);
            return true;
        }
        if count >= self.max_requests {
            return false;
        }
        entry.1 += 1;
        true
    }
}

/// Middleware enforcing the limiter. Keys on the authenticated principal,
/// falling back to the forwarded client address.
pub async fn limit(
    State(limiter): State<Arc<RateLimiter>>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let key = req
        .extensions()
        .get::<Principal>()
        .map(|p| p.email.clone())
        .or_else(|| {
            req.headers()
                .get("x-forwarded-for")
                .and_then(|h| h.to_str().ok())
                .map(|s| s.to_string())
        })
        .unwrap_or_else(|| "anonymous".to_string());

    if !limiter.check(&key) {
        tracing::warn!(target: "rate_limit", client = %key, "request rejected");
        return Err(AppError::RateLimited);
    }
    Ok(next.run(req).await)
}
