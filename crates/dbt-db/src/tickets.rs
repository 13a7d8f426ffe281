//! SQLite implementation of the workflow's `TicketStore`.
//!
//! Every write runs in one transaction together with its history row.
//! Transitions are `UPDATE ... WHERE id = ? AND status = ? AND version = ?`;
//! zero changed rows means the ticket is gone or someone else moved it.

use crate::Database;
use crate::models::{HistoryRow, TicketRow};
use crate::queries::OptionalExt;
use anyhow::anyhow;
use chrono::{DateTime, Utc};
use dbt_types::{Ticket, TicketAction, TicketHistoryEntry, TicketStatus};
use dbt_workflow::{StoreError, TicketChange, TicketStore};
use rusqlite::{Connection, ErrorCode};
use tracing::debug;
use uuid::Uuid;

impl TicketStore for Database {
    fn ticket(&self, id: Uuid) -> Result<Option<Ticket>, StoreError> {
        Ok(self.with_conn(|conn| query_ticket(conn, "id", id))?)
    }

    fn ticket_for_requester(&self, requester_id: Uuid) -> Result<Option<Ticket>, StoreError> {
        Ok(self.with_conn(|conn| query_ticket(conn, "requester_id", requester_id))?)
    }

    fn insert_ticket(&self, ticket: &Ticket) -> Result<(), StoreError> {
        let outcome = self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let inserted = tx.execute(
                "INSERT INTO tickets (id, requester_id, display_name, account_number, ifsc_code,
                                      description, status, version, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                rusqlite::params![
                    ticket.id.to_string(),
                    ticket.requester_id.to_string(),
                    ticket.display_name,
                    ticket.bank.account_number,
                    ticket.bank.ifsc_code,
                    ticket.description,
                    ticket.status.as_str(),
                    ticket.version,
                    ticket.created_at.to_rfc3339(),
                    ticket.updated_at.to_rfc3339(),
                ],
            );

            match inserted {
                Ok(_) => {}
                Err(rusqlite::Error::SqliteFailure(e, _))
                    if e.code == ErrorCode::ConstraintViolation =>
                {
                    // Only the requester uniqueness can trip here; report what is stored.
                    let existing = query_ticket(&tx, "requester_id", ticket.requester_id)?;
                    return Ok(Err(existing));
                }
                Err(e) => return Err(e.into()),
            }

            insert_history(
                &tx,
                ticket.id,
                TicketAction::Submit,
                TicketStatus::NotSubmitted,
                ticket.status,
                ticket.requester_id,
                ticket.version,
                ticket.created_at,
            )?;
            tx.commit()?;
            Ok(Ok(()))
        })?;

        match outcome {
            Ok(()) => {
                debug!("Inserted ticket {} for {}", ticket.id, ticket.requester_id);
                Ok(())
            }
            Err(Some(existing)) => Err(StoreError::Conflict {
                ticket_id: existing.id,
                actual_status: existing.status,
                actual_version: existing.version,
            }),
            Err(None) => Err(StoreError::Backend(anyhow!(
                "constraint violation inserting ticket {}",
                ticket.id
            ))),
        }
    }

    fn apply_change(&self, change: &TicketChange) -> Result<Ticket, StoreError> {
        let outcome = self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let next_version = change.expected_version + 1;
            let (account_number, ifsc_code) = match &change.bank {
                Some(bank) => (Some(bank.account_number.as_str()), Some(bank.ifsc_code.as_str())),
                None => (None, None),
            };

            // Rows written before the status rename still say 'open'.
            let (expected, expected_alias) = match change.expected_status {
                TicketStatus::PendingInstitute => ("pending_institute", "open"),
                other => (other.as_str(), other.as_str()),
            };
            let changed = tx.execute(
                "UPDATE tickets
                 SET status = ?1,
                     version = ?2,
                     account_number = COALESCE(?3, account_number),
                     ifsc_code = COALESCE(?4, ifsc_code),
                     description = COALESCE(?5, description),
                     updated_at = ?6
                 WHERE id = ?7 AND version = ?8 AND status IN (?9, ?10)",
                rusqlite::params![
                    change.next_status.as_str(),
                    next_version,
                    account_number,
                    ifsc_code,
                    change.description.as_deref(),
                    change.at.to_rfc3339(),
                    change.ticket_id.to_string(),
                    change.expected_version,
                    expected,
                    expected_alias,
                ],
            )?;

            if changed == 0 {
                let current = query_ticket(&tx, "id", change.ticket_id)?;
                return Ok(Err(current));
            }

            insert_history(
                &tx,
                change.ticket_id,
                change.action,
                change.expected_status,
                change.next_status,
                change.actor_id,
                next_version,
                change.at,
            )?;
            let updated = query_ticket(&tx, "id", change.ticket_id)?
                .ok_or_else(|| anyhow!("ticket {} vanished mid-transaction", change.ticket_id))?;
            tx.commit()?;
            Ok(Ok(updated))
        })?;

        match outcome {
            Ok(ticket) => {
                debug!(
                    "Ticket {} {} -> {} (v{}) by {}",
                    ticket.id, change.expected_status, ticket.status, ticket.version, change.actor_id
                );
                Ok(ticket)
            }
            Err(None) => Err(StoreError::NotFound(change.ticket_id)),
            Err(Some(current)) => Err(StoreError::Conflict {
                ticket_id: current.id,
                actual_status: current.status,
                actual_version: current.version,
            }),
        }
    }

    fn tickets_with_status(&self, status: Option<TicketStatus>) -> Result<Vec<Ticket>, StoreError> {
        Ok(self.with_conn(|conn| {
            let (filter, param) = match status {
                Some(TicketStatus::PendingInstitute) => {
                    ("WHERE status IN (?1, 'open')", Some("pending_institute"))
                }
                Some(status) => ("WHERE status = ?1", Some(status.as_str())),
                None => ("", None),
            };
            let sql = format!(
                "SELECT {} FROM tickets {} ORDER BY updated_at",
                TicketRow::COLUMNS,
                filter
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = match param {
                Some(status) => stmt
                    .query_map([status], TicketRow::from_row)?
                    .collect::<Result<Vec<_>, _>>()?,
                None => stmt
                    .query_map([], TicketRow::from_row)?
                    .collect::<Result<Vec<_>, _>>()?,
            };
            rows.into_iter().map(TicketRow::into_ticket).collect()
        })?)
    }

    fn history(&self, ticket_id: Uuid) -> Result<Vec<TicketHistoryEntry>, StoreError> {
        Ok(self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT ticket_id, action, from_status, to_status, actor_id, version, at
                 FROM ticket_history WHERE ticket_id = ?1 ORDER BY id",
            )?;
            let rows = stmt
                .query_map([ticket_id.to_string()], HistoryRow::from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            rows.into_iter().map(HistoryRow::into_entry).collect()
        })?)
    }
}

fn query_ticket(conn: &Connection, column: &str, id: Uuid) -> anyhow::Result<Option<Ticket>> {
    let sql = format!("SELECT {} FROM tickets WHERE {} = ?1", TicketRow::COLUMNS, column);
    let row = conn.query_row(&sql, [id.to_string()], TicketRow::from_row).optional()?;
    row.map(TicketRow::into_ticket).transpose()
}

#[allow(clippy::too_many_arguments)]
fn insert_history(
    conn: &Connection,
    ticket_id: Uuid,
    action: TicketAction,
    from: TicketStatus,
    to: TicketStatus,
    actor_id: Uuid,
    version: i64,
    at: DateTime<Utc>,
) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO ticket_history (ticket_id, action, from_status, to_status, actor_id, version, at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        rusqlite::params![
            ticket_id.to_string(),
            action.as_str(),
            from.as_str(),
            to.as_str(),
            actor_id.to_string(),
            version,
            at.to_rfc3339(),
        ],
    )?;
    Ok(())
}
