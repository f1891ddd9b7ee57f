//! Authentication
//!
//! JWT validation, the [`Principal`] identity passed explicitly into service
//! methods, and the axum middleware/extractors that produce it.

mod extractor;
mod jwt;
mod middleware;
mod principal;

pub use extractor::MaybePrincipal;
pub use jwt::{Claims, JwtConfig, JwtError, JwtService};
pub use middleware::{require_admin, require_auth};
pub use principal::Principal;
