//! Authentication middleware
//!
//! Axum middleware for JWT authentication and role checks.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::auth::{JwtService, Principal};
use crate::core::ServerState;
use crate::security_log;
use crate::utils::AppError;

/// Authentication middleware
///
/// Extracts and validates the JWT from `Authorization: Bearer <token>` and
/// injects the [`Principal`] into the request extensions.
///
/// # Paths that skip authentication
///
/// - `OPTIONS *` (CORS preflight)
/// - non-`/api/` paths (health check)
/// - `GET /api/slots` (public listing)
/// - `GET /api/doctors/*/rating` handles its own optional principal
pub async fn require_auth(
    State(state): State<ServerState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let path = req.uri().path();

    if req.method() == http::Method::OPTIONS {
        return Ok(next.run(req).await);
    }

    if !path.starts_with("/api/") {
        return Ok(next.run(req).await);
    }

    // Public API routes
    let is_public = (req.method() == http::Method::GET && path == "/api/slots")
        || (req.method() == http::Method::GET
            && path.starts_with("/api/doctors/")
            && path.ends_with("/rating"));
    if is_public {
        // Attach a principal when a valid token is present, but do not
        // require one.
        if let Some(principal) = try_principal(&state, &req) {
            req.extensions_mut().insert(principal);
        }
        return Ok(next.run(req).await);
    }

    let jwt_service = state.get_jwt_service();
    let auth_header = req
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = match auth_header {
        Some(header) => JwtService::extract_from_header(header).ok_or(AppError::InvalidToken)?,
        None => {
            security_log!("WARN", "auth_missing", uri = format!("{:?}", req.uri()));
            return Err(AppError::Unauthorized);
        }
    };

    match jwt_service.validate_token(token) {
        Ok(claims) => {
            let principal =
                Principal::try_from(claims).map_err(|_| AppError::InvalidToken)?;
            req.extensions_mut().insert(principal);
            Ok(next.run(req).await)
        }
        Err(e) => {
            security_log!(
                "WARN",
                "auth_failed",
                error = format!("{}", e),
                uri = format!("{:?}", req.uri())
            );

            match e {
                crate::auth::JwtError::ExpiredToken => Err(AppError::TokenExpired),
                _ => Err(AppError::InvalidToken),
            }
        }
    }
}

fn try_principal(state: &ServerState, req: &Request) -> Option<Principal> {
    let header = req
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())?;
    let token = JwtService::extract_from_header(header)?;
    let claims = state.get_jwt_service().validate_token(token).ok()?;
    Principal::try_from(claims).ok()
}

/// Admin middleware - requires an admin or super-admin role
pub async fn require_admin(req: Request, next: Next) -> Result<Response, AppError> {
    let principal = req
        .extensions()
        .get::<Principal>()
        .ok_or(AppError::Unauthorized)?;
    if !principal.is_admin() {
        security_log!(
            "WARN",
            "admin_required",
            user_id = principal.user_id.clone(),
            user_role = format!("{:?}", principal.role)
        );
        return Err(AppError::Forbidden("Admin role required".to_string()));
    }

    Ok(next.run(req).await)
}
