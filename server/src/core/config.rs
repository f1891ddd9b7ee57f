//! Server configuration
//!
//! All values load from the environment with sensible defaults; `.env` is
//! read at startup by `main`.
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | WORK_DIR | /var/lib/careslot | data and log directory |
//! | HTTP_PORT | 3000 | HTTP API port |
//! | ENVIRONMENT | development | development, staging or production |
//! | JWT_SECRET | (dev fallback) | signing secret, at least 32 chars |
//! | JWT_EXPIRATION_MINUTES | 1440 | token lifetime |
//! | SMTP_SERVER | unset | SMTP relay host; unset means emails are dropped |
//! | SMTP_PORT | 587 | SMTP relay port |
//! | SMTP_USERNAME / SMTP_PASSWORD | empty | SMTP credentials |
//! | SMTP_FROM_EMAIL | noreply@careslot.app | sender address |
//! | SMTP_FROM_NAME | CareSlot | sender display name |
//! | RATE_LIMIT_WINDOW_SECS | 60 | claim rate-limit window |
//! | RATE_LIMIT_MAX_REQUESTS | 10 | claims allowed per window per client |

use std::path::PathBuf;

use crate::auth::JwtConfig;
use crate::services::SmtpConfig;

#[derive(Debug, Clone)]
pub struct Config {
    /// Working directory holding the database and log files
    pub work_dir: String,
    pub http_port: u16,
    pub jwt: JwtConfig,
    /// development | staging | production
    pub environment: String,
    /// SMTP gateway; `None` falls back to the noop mailer
    pub smtp: Option<SmtpConfig>,
    pub rate_limit_window_secs: u64,
    pub rate_limit_max_requests: u32,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "/var/lib/careslot".into()),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            jwt: JwtConfig::default(),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            smtp: smtp_from_env(),
            rate_limit_window_secs: std::env::var("RATE_LIMIT_WINDOW_SECS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(60),
            rate_limit_max_requests: std::env::var("RATE_LIMIT_MAX_REQUESTS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(10),
        }
    }

    /// Override the fields tests care about
    pub fn with_overrides(work_dir: impl Into<String>, http_port: u16) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.http_port = http_port;
        config
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    pub fn database_path(&self) -> PathBuf {
        PathBuf::from(&self.work_dir)
            .join("database")
            .join("careslot.db")
    }

    pub fn log_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("logs")
    }

    /// Create the work directory layout if it does not exist yet
    pub fn ensure_work_dir_structure(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(PathBuf::from(&self.work_dir).join("database"))?;
        std::fs::create_dir_all(self.log_dir())?;
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

fn smtp_from_env() -> Option<SmtpConfig> {
    let server = std::env::var("SMTP_SERVER").ok()?;
    Some(SmtpConfig {
        server,
        port: std::env::var("SMTP_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(587),
        username: std::env::var("SMTP_USERNAME").unwrap_or_default(),
        password: std::env::var("SMTP_PASSWORD").unwrap_or_default(),
        from_email: std::env::var("SMTP_FROM_EMAIL")
            .unwrap_or_else(|_| "noreply@careslot.app".into()),
        from_name: std::env::var("SMTP_FROM_NAME").unwrap_or_else(|_| "CareSlot".into()),
    })
}
