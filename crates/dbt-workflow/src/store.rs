use chrono::{DateTime, Utc};
use dbt_types::{BankDetails, Ticket, TicketAction, TicketHistoryEntry, TicketStatus};
use thiserror::Error;
use uuid::Uuid;

/// One conditional update of a ticket.
///
/// The store applies it only if the row still has `expected_status` and
/// `expected_version`, bumps the version, and records a history entry.
#[derive(Debug, Clone)]
pub struct TicketChange {
    pub ticket_id: Uuid,
    pub action: TicketAction,
    pub actor_id: Uuid,
    pub expected_status: TicketStatus,
    pub expected_version: i64,
    pub next_status: TicketStatus,
    /// Replaces the stored bank details when set.
    pub bank: Option<BankDetails>,
    /// Replaces the stored description when set.
    pub description: Option<String>,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("ticket {0} not found")]
    NotFound(Uuid),

    /// The row no longer matches what the caller read.
    #[error("ticket {ticket_id} is now {actual_status} at version {actual_version}")]
    Conflict {
        ticket_id: Uuid,
        actual_status: TicketStatus,
        actual_version: i64,
    },

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// Persistence seam for the workflow. Implemented over SQLite by `dbt-db`.
pub trait TicketStore {
    fn ticket(&self, id: Uuid) -> Result<Option<Ticket>, StoreError>;

    fn ticket_for_requester(&self, requester_id: Uuid) -> Result<Option<Ticket>, StoreError>;

    /// Insert a freshly submitted ticket and its `submit` history entry.
    /// A second ticket for the same requester is a [`StoreError::Conflict`].
    fn insert_ticket(&self, ticket: &Ticket) -> Result<(), StoreError>;

    fn apply_change(&self, change: &TicketChange) -> Result<Ticket, StoreError>;

    fn tickets_with_status(&self, status: Option<TicketStatus>) -> Result<Vec<Ticket>, StoreError>;

    fn history(&self, ticket_id: Uuid) -> Result<Vec<TicketHistoryEntry>, StoreError>;
}
