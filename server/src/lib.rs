//! CareSlot Server - appointment booking platform core
//!
//! # Architecture
//!
//! - **booking** (`booking`): slot claim, cancellation, forced delete,
//!   booking number allocation
//! - **ratings** (`ratings`): write-once doctor ratings with a full
//!   aggregate recompute
//! - **message** (`message`): in-process event feed over a broadcast channel
//! - **db** (`db`): embedded SurrealDB storage
//! - **auth** (`auth`): JWT validation and the request principal
//! - **api** (`api`): RESTful API surface
//!
//! # Module layout
//!
//! ```text
//! server/src/
//! ├── core/          # configuration, state, server runner
//! ├── auth/          # JWT validation, principal, middleware
//! ├── booking/       # booking lifecycle service
//! ├── ratings/       # rating service
//! ├── services/      # mailer, side-effect policy
//! ├── api/           # HTTP routes and handlers
//! ├── message/       # event bus
//! ├── db/            # models, repositories, schema
//! └── utils/         # errors, logging, validation, time helpers
//! ```

pub mod api;
pub mod auth;
pub mod booking;
pub mod core;
pub mod db;
pub mod message;
pub mod ratings;
pub mod services;
pub mod utils;

// Re-export public types
pub use auth::{JwtService, Principal};
pub use booking::BookingService;
pub use core::{Config, Server, ServerState};
pub use message::{BusMessage, EventPublisher, EventTopic, MessageBus};
pub use ratings::RatingService;
pub use utils::{AppError, AppResponse, AppResult};

pub use utils::logger::{init_logger, init_logger_with_file};

// Security logging macro - supports tracing format specifiers
#[macro_export]
macro_rules! security_log {
    ($level:expr, $event:expr, $($key:ident = $value:expr),*) => {
        tracing::info!(
            target: "security",
            level = $level,
            event = $event,
            $($key = $value),*
        );
    };
}

/// Load `.env`, create the work directory and initialize logging.
pub fn setup_environment() -> Result<Config, AppError> {
    let _ = dotenv::dotenv();

    let config = Config::from_env();
    config
        .ensure_work_dir_structure()
        .map_err(|e| AppError::Internal(format!("Failed to create work directory: {e}")))?;

    if config.is_production() {
        let log_dir = config.log_dir();
        init_logger_with_file(None, log_dir.to_str());
    } else {
        init_logger();
    }

    Ok(config)
}

pub fn print_banner() {
    println!(
        r#"
   ______                 _____ __      __
  / ____/___ _________   / ___// /___  / /_
 / /   / __ `/ ___/ _ \  \__ \/ / __ \/ __/
/ /___/ /_/ / /  /  __/ ___/ / / /_/ / /_
\____/\__,_/_/   \___/ /____/_/\____/\__/
    "#
    );
}
