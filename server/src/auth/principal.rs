//! Request principal
//!
//! The authenticated identity, parsed from JWT claims by the middleware and
//! passed explicitly into every service method that needs authorization
//! context. No request-local ambient state.

use serde::{Deserialize, Serialize};

use super::jwt::Claims;
use crate::db::models::Role;

/// Authenticated caller identity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Principal {
    /// `user:...` record id string
    pub user_id: String,
    pub email: String,
    pub role: Role,
}

impl Principal {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Convenience constructor for tests
    pub fn new(user_id: impl Into<String>, email: impl Into<String>, role: Role) -> Self {
        Self {
            user_id: user_id.into(),
            email: email.into(),
            role,
        }
    }
}

impl TryFrom<Claims> for Principal {
    type Error = String;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        let role = match claims.role.as_str() {
            "customer" => Role::Customer,
            "provider" => Role::Provider,
            "admin" => Role::Admin,
            "super_admin" => Role::SuperAdmin,
            other => return Err(format!("unknown role: {other}")),
        };
        Ok(Self {
            user_id: claims.sub,
            email: claims.email,
            role,
        })
    }
}
