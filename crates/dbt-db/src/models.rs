//! Database row types. These map directly to SQLite rows and are converted
//! into the `dbt-types` models at the edge of this crate.
use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use dbt_types::{
    BankDetails, Event, EventReport, EventStatus, Profile, Role, Ticket, TicketAction,
    TicketHistoryEntry, TicketStatus,
};
use rusqlite::Row;
use uuid::Uuid;

pub struct ProfileRow {
    pub id: String,
    pub username: String,
    pub password: String,
    pub role: String,
    pub display_name: String,
    pub address: String,
    pub district: String,
    pub created_at: String,
}

impl ProfileRow {
    pub(crate) const COLUMNS: &'static str =
        "id, username, password, role, display_name, address, district, created_at";

    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            username: row.get(1)?,
            password: row.get(2)?,
            role: row.get(3)?,
            display_name: row.get(4)?,
            address: row.get(5)?,
            district: row.get(6)?,
            created_at: row.get(7)?,
        })
    }

    pub fn into_profile(self) -> Result<Profile> {
        Ok(Profile {
            id: parse_uuid(&self.id)?,
            username: self.username,
            role: self.role.parse::<Role>()?,
            display_name: self.display_name,
            address: self.address,
            district: self.district,
            created_at: parse_timestamp(&self.created_at)?,
        })
    }
}

pub struct TicketRow {
    pub id: String,
    pub requester_id: String,
    pub display_name: String,
    pub account_number: String,
    pub ifsc_code: String,
    pub description: String,
    pub status: String,
    pub version: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl TicketRow {
    pub(crate) const COLUMNS: &'static str = "id, requester_id, display_name, account_number, \
         ifsc_code, description, status, version, created_at, updated_at";

    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            requester_id: row.get(1)?,
            display_name: row.get(2)?,
            account_number: row.get(3)?,
            ifsc_code: row.get(4)?,
            description: row.get(5)?,
            status: row.get(6)?,
            version: row.get(7)?,
            created_at: row.get(8)?,
            updated_at: row.get(9)?,
        })
    }

    pub fn into_ticket(self) -> Result<Ticket> {
        Ok(Ticket {
            id: parse_uuid(&self.id)?,
            requester_id: parse_uuid(&self.requester_id)?,
            display_name: self.display_name,
            bank: BankDetails {
                account_number: self.account_number,
                ifsc_code: self.ifsc_code,
            },
            description: self.description,
            status: self.status.parse::<TicketStatus>()?,
            version: self.version,
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: parse_timestamp(&self.updated_at)?,
        })
    }
}

pub struct HistoryRow {
    pub ticket_id: String,
    pub action: String,
    pub from_status: String,
    pub to_status: String,
    pub actor_id: String,
    pub version: i64,
    pub at: String,
}

impl HistoryRow {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            ticket_id: row.get(0)?,
            action: row.get(1)?,
            from_status: row.get(2)?,
            to_status: row.get(3)?,
            actor_id: row.get(4)?,
            version: row.get(5)?,
            at: row.get(6)?,
        })
    }

    pub fn into_entry(self) -> Result<TicketHistoryEntry> {
        Ok(TicketHistoryEntry {
            ticket_id: parse_uuid(&self.ticket_id)?,
            action: self.action.parse::<TicketAction>()?,
            from_status: self.from_status.parse::<TicketStatus>()?,
            to_status: self.to_status.parse::<TicketStatus>()?,
            actor_id: parse_uuid(&self.actor_id)?,
            version: self.version,
            at: parse_timestamp(&self.at)?,
        })
    }
}

pub struct EventRow {
    pub id: String,
    pub author_id: String,
    pub title: String,
    pub event_date: String,
    pub venue: String,
    pub status: String,
    pub total_attendees: Option<i64>,
    pub students_verified: Option<i64>,
    pub summary: Option<String>,
    pub reported_at: Option<String>,
    pub created_at: String,
}

impl EventRow {
    pub(crate) const COLUMNS: &'static str = "id, author_id, title, event_date, venue, status, \
         total_attendees, students_verified, summary, reported_at, created_at";

    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            author_id: row.get(1)?,
            title: row.get(2)?,
            event_date: row.get(3)?,
            venue: row.get(4)?,
            status: row.get(5)?,
            total_attendees: row.get(6)?,
            students_verified: row.get(7)?,
            summary: row.get(8)?,
            reported_at: row.get(9)?,
            created_at: row.get(10)?,
        })
    }

    pub fn into_event(self) -> Result<Event> {
        // A report exists only once all of its columns are filled.
        let report = match (
            self.total_attendees,
            self.students_verified,
            self.summary,
            self.reported_at,
        ) {
            (Some(total), Some(verified), Some(summary), Some(at)) => Some(EventReport {
                total_attendees: u32::try_from(total).context("negative attendee count")?,
                students_verified: u32::try_from(verified).context("negative verified count")?,
                summary,
                reported_at: parse_timestamp(&at)?,
            }),
            _ => None,
        };

        Ok(Event {
            id: parse_uuid(&self.id)?,
            author_id: parse_uuid(&self.author_id)?,
            title: self.title,
            event_date: NaiveDate::parse_from_str(&self.event_date, "%Y-%m-%d")
                .with_context(|| format!("bad event date {:?}", self.event_date))?,
            venue: self.venue,
            status: self.status.parse::<EventStatus>()?,
            report,
            created_at: parse_timestamp(&self.created_at)?,
        })
    }
}

pub(crate) fn parse_uuid(value: &str) -> Result<Uuid> {
    Uuid::parse_str(value).map_err(|e| anyhow!("bad id {:?} in database: {}", value, e))
}

/// RFC 3339 as written by this crate, or SQLite's `datetime('now')` format.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
        .map(|naive| naive.and_utc())
        .with_context(|| format!("bad timestamp {:?} in database", value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_accept_both_formats() {
        let a = parse_timestamp("2025-11-15T10:30:00+00:00").unwrap();
        let b = parse_timestamp("2025-11-15 10:30:00").unwrap();
        assert_eq!(a, b);
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[test]
    fn partial_report_columns_mean_no_report() {
        let row = EventRow {
            id: Uuid::new_v4().to_string(),
            author_id: Uuid::new_v4().to_string(),
            title: "Camp".into(),
            event_date: "2025-12-01".into(),
            venue: "Hall".into(),
            status: "scheduled".into(),
            total_attendees: Some(10),
            students_verified: None,
            summary: None,
            reported_at: None,
            created_at: "2025-11-01 09:00:00".into(),
        };
        let event = row.into_event().unwrap();
        assert!(event.report.is_none());
        assert_eq!(event.event_date, NaiveDate::from_ymd_opt(2025, 12, 1).unwrap());
    }
}
