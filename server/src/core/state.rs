//! Server state
//!
//! Holds the shared handles every request needs: configuration, the embedded
//! database, the JWT service, the event bus and the mailer. `Clone` is a
//! handful of `Arc` bumps.

use std::path::PathBuf;
use std::sync::Arc;

use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use crate::auth::JwtService;
use crate::booking::BookingService;
use crate::core::Config;
use crate::db::DbService;
use crate::message::{EventPublisher, MessageBus};
use crate::ratings::RatingService;
use crate::services::{Mailer, NoopMailer, SmtpMailer};
use crate::utils::AppError;

#[derive(Debug, Clone)]
pub struct ServerState {
    pub config: Config,
    pub db: Surreal<Db>,
    pub jwt_service: Arc<JwtService>,
    /// Event bus; also the production [`EventPublisher`]
    pub bus: Arc<MessageBus>,
    pub publisher: Arc<dyn EventPublisher>,
    pub mailer: Arc<dyn Mailer>,
}

impl ServerState {
    /// Initialize everything: work directory, database, JWT, bus, mailer.
    pub async fn initialize(config: &Config) -> Result<Self, AppError> {
        config
            .ensure_work_dir_structure()
            .map_err(|e| AppError::Internal(format!("Failed to create work directory: {e}")))?;

        let db_path = config.database_path();
        let db = DbService::new(&db_path.to_string_lossy()).await?.db;

        let jwt_service = Arc::new(JwtService::with_config(config.jwt.clone()));
        let bus = Arc::new(MessageBus::new());
        let publisher: Arc<dyn EventPublisher> = bus.clone();
        let mailer: Arc<dyn Mailer> = match &config.smtp {
            Some(smtp) => Arc::new(SmtpMailer::new(smtp.clone())),
            None => {
                tracing::warn!("SMTP not configured, outgoing emails will be dropped");
                Arc::new(NoopMailer)
            }
        };

        Ok(Self {
            config: config.clone(),
            db,
            jwt_service,
            bus,
            publisher,
            mailer,
        })
    }

    /// State over an in-memory database (tests)
    pub async fn for_tests() -> Result<Self, AppError> {
        let db = DbService::memory().await?.db;
        let bus = Arc::new(MessageBus::new());
        let publisher: Arc<dyn EventPublisher> = bus.clone();
        Ok(Self {
            config: Config::with_overrides("/tmp/careslot-test", 0),
            db,
            jwt_service: Arc::new(JwtService::default()),
            bus,
            publisher,
            mailer: Arc::new(NoopMailer),
        })
    }

    pub fn get_db(&self) -> Surreal<Db> {
        self.db.clone()
    }

    pub fn get_jwt_service(&self) -> Arc<JwtService> {
        self.jwt_service.clone()
    }

    pub fn work_dir(&self) -> PathBuf {
        PathBuf::from(&self.config.work_dir)
    }

    pub fn booking_service(&self) -> BookingService {
        BookingService::new(self.db.clone(), self.publisher.clone(), self.mailer.clone())
    }

    pub fn rating_service(&self) -> RatingService {
        RatingService::new(self.db.clone(), self.publisher.clone())
    }
}
