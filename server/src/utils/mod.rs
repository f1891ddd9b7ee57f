//! Utility module - shared helpers and types
//!
//! - [`AppError`] / [`AppResponse`] - unified error and response envelope
//! - [`logger`] - tracing setup
//! - [`validation`] - input validation helpers
//! - [`time`] - slot schedule parsing

pub mod error;
pub mod logger;
pub mod time;
pub mod validation;

pub use error::{AppError, AppResponse, AppResult, ok, ok_with_warnings};
