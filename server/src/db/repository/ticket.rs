//! Ticket Repository
//!
//! Tickets are created once and never mutated. There is deliberately no
//! delete path wired into booking deletion: tickets are permanent
//! historical artifacts.

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::Ticket;
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};

const TABLE: &str = "ticket";

#[derive(Clone)]
pub struct TicketRepository {
    base: BaseRepository,
}

impl TicketRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Create the ticket artifact for a booking
    pub async fn create(&self, ticket: Ticket) -> RepoResult<Ticket> {
        let created: Option<Ticket> = self.base.db().create(TABLE).content(ticket).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create ticket".to_string()))
    }

    /// Find the ticket for a booking
    pub async fn find_by_booking(&self, booking: &RecordId) -> RepoResult<Option<Ticket>> {
        let tickets: Vec<Ticket> = self
            .base
            .db()
            .query("SELECT * FROM ticket WHERE booking = $booking LIMIT 1")
            .bind(("booking", booking.to_string()))
            .await?
            .take(0)?;
        Ok(tickets.into_iter().next())
    }
}
