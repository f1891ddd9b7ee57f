//! Principal extractor
//!
//! Lets protected handlers take `principal: Principal` as an argument; the
//! value is injected by the auth middleware, with a header-validation
//! fallback for routes mounted without it.

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::auth::{JwtService, Principal};
use crate::core::ServerState;
use crate::utils::AppError;

impl FromRequestParts<ServerState> for Principal {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        // Already extracted by the middleware
        if let Some(principal) = parts.extensions.get::<Principal>() {
            return Ok(principal.clone());
        }

        let auth_header = parts
            .headers
            .get(http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or(AppError::Unauthorized)?;

        let token =
            JwtService::extract_from_header(auth_header).ok_or(AppError::InvalidToken)?;

        match state.get_jwt_service().validate_token(token) {
            Ok(claims) => {
                let principal =
                    Principal::try_from(claims).map_err(|_| AppError::InvalidToken)?;
                parts.extensions.insert(principal.clone());
                Ok(principal)
            }
            Err(crate::auth::JwtError::ExpiredToken) => Err(AppError::TokenExpired),
            Err(_) => Err(AppError::InvalidToken),
        }
    }
}

/// Optional principal for public routes that personalize when a caller is
/// authenticated (e.g. the rating read path).
pub struct MaybePrincipal(pub Option<Principal>);

impl FromRequestParts<ServerState> for MaybePrincipal {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        match Principal::from_request_parts(parts, state).await {
            Ok(principal) => Ok(MaybePrincipal(Some(principal))),
            Err(_) => Ok(MaybePrincipal(None)),
        }
    }
}
