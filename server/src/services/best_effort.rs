//! Best-effort side-effect policy
//!
//! Emails and event publishes must never fail or block the primary
//! operation. [`best_effort`] runs a side effect, logs any failure as a
//! warning, and hands back an optional warning string for the caller to
//! attach to its (still successful) response.

use std::future::Future;

/// Run a fallible side effect; convert failure into a soft warning.
pub async fn best_effort<F, E>(label: &str, fut: F) -> Option<String>
where
    F: Future<Output = Result<(), E>>,
    E: std::fmt::Display,
{
    match fut.await {
        Ok(()) => None,
        Err(e) => {
            tracing::warn!(target: "side_effect", side_effect = label, error = %e, "side effect failed");
            Some(format!("{label} failed: {e}"))
        }
    }
}
