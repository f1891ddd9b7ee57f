//! Health check handler

use axum::Json;

use crate::utils::{AppResponse, ok};

/// GET /health - public liveness probe
pub async fn health() -> Json<AppResponse<serde_json::Value>> {
    ok(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
