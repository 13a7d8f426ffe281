use crate::Database;
use crate::models::{EventRow, ProfileRow};
use anyhow::Result;
use chrono::{NaiveDate, Utc};
use dbt_types::api::{RegionStat, StatusCounts};
use dbt_types::{Event, EventReport, EventStatus, Role, TicketStatus};
use rusqlite::{Connection, ErrorCode};
use tracing::warn;
use uuid::Uuid;

/// Fields of a new profile. The password is already hashed.
pub struct NewProfile<'a> {
    pub id: Uuid,
    pub username: &'a str,
    pub password_hash: &'a str,
    pub role: Role,
    pub display_name: &'a str,
    pub address: &'a str,
    pub district: &'a str,
}

impl Database {
    // -- Profiles --

    /// Insert a profile. Returns `false` when the username is already taken.
    pub fn create_profile(&self, profile: &NewProfile<'_>) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let inserted = conn.execute(
                "INSERT INTO profiles (id, username, password, role, display_name, address, district, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                rusqlite::params![
                    profile.id.to_string(),
                    profile.username,
                    profile.password_hash,
                    profile.role.as_str(),
                    profile.display_name,
                    profile.address,
                    profile.district,
                    Utc::now().to_rfc3339(),
                ],
            );
            match inserted {
                Ok(_) => Ok(true),
                Err(rusqlite::Error::SqliteFailure(e, _))
                    if e.code == ErrorCode::ConstraintViolation =>
                {
                    Ok(false)
                }
                Err(e) => Err(e.into()),
            }
        })
    }

    pub fn get_profile_by_username(&self, username: &str) -> Result<Option<ProfileRow>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {} FROM profiles WHERE username = ?1", ProfileRow::COLUMNS);
            conn.query_row(&sql, [username], ProfileRow::from_row).optional()
        })
    }

    pub fn get_profile(&self, id: Uuid) -> Result<Option<ProfileRow>> {
        self.with_conn(|conn| query_profile(conn, id))
    }

    pub fn username_taken(&self, username: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM profiles WHERE username = ?1",
                [username],
                |row| row.get(0),
            )?;
            Ok(count > 0)
        })
    }

    // -- Events --

    pub fn insert_event(
        &self,
        id: Uuid,
        author_id: Uuid,
        title: &str,
        event_date: NaiveDate,
        venue: &str,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO events (id, author_id, title, event_date, venue, status, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                rusqlite::params![
                    id.to_string(),
                    author_id.to_string(),
                    title,
                    event_date.format("%Y-%m-%d").to_string(),
                    venue,
                    EventStatus::Scheduled.as_str(),
                    Utc::now().to_rfc3339(),
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_event(&self, id: Uuid) -> Result<Option<Event>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {} FROM events WHERE id = ?1", EventRow::COLUMNS);
            let row = conn.query_row(&sql, [id.to_string()], EventRow::from_row).optional()?;
            row.map(EventRow::into_event).transpose()
        })
    }

    /// Events ordered by date; scheduled ones soonest first.
    pub fn list_events(&self, status: Option<EventStatus>) -> Result<Vec<Event>> {
        self.with_conn(|conn| query_events(conn, status))
    }

    /// Store the outcome of an event and mark it completed. Returns the
    /// updated event, or `None` if it does not exist.
    pub fn save_event_report(&self, id: Uuid, report: &EventReport) -> Result<Option<Event>> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE events
                 SET status = ?2, total_attendees = ?3, students_verified = ?4, summary = ?5, reported_at = ?6
                 WHERE id = ?1",
                rusqlite::params![
                    id.to_string(),
                    EventStatus::Completed.as_str(),
                    report.total_attendees,
                    report.students_verified,
                    report.summary,
                    report.reported_at.to_rfc3339(),
                ],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            let sql = format!("SELECT {} FROM events WHERE id = ?1", EventRow::COLUMNS);
            let row = conn.query_row(&sql, [id.to_string()], EventRow::from_row)?;
            row.into_event().map(Some)
        })
    }

    // -- Aggregates --

    pub fn ticket_counts(&self) -> Result<StatusCounts> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT status, COUNT(*) FROM tickets GROUP BY status")?;
            let rows = stmt
                .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            let mut counts = StatusCounts::default();
            for (status, count) in rows {
                match status.parse::<TicketStatus>() {
                    Ok(status) => counts.add(status, count.max(0) as u64),
                    Err(e) => warn!("Ignoring {} tickets: {}", count, e),
                }
            }
            Ok(counts)
        })
    }

    /// Verified and still-open tickets per requester district. Rejected
    /// tickets count toward neither.
    pub fn district_stats(&self) -> Result<Vec<RegionStat>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT p.district,
                        SUM(CASE WHEN t.status = 'verified' THEN 1 ELSE 0 END),
                        SUM(CASE WHEN t.status IN ('not_submitted', 'pending_institute', 'pending_admin', 'open')
                                 THEN 1 ELSE 0 END)
                 FROM tickets t
                 JOIN profiles p ON p.id = t.requester_id
                 WHERE p.district <> ''
                 GROUP BY p.district
                 ORDER BY p.district",
            )?;
            let stats = stmt
                .query_map([], |row| {
                    Ok(RegionStat {
                        region: row.get(0)?,
                        enabled: row.get::<_, i64>(1)?.max(0) as u64,
                        pending: row.get::<_, i64>(2)?.max(0) as u64,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(stats)
        })
    }

}

fn query_profile(conn: &Connection, id: Uuid) -> Result<Option<ProfileRow>> {
    let sql = format!("SELECT {} FROM profiles WHERE id = ?1", ProfileRow::COLUMNS);
    conn.query_row(&sql, [id.to_string()], ProfileRow::from_row).optional()
}

fn query_events(conn: &Connection, status: Option<EventStatus>) -> Result<Vec<Event>> {
    let sql = match status {
        Some(_) => format!(
            "SELECT {} FROM events WHERE status = ?1 ORDER BY event_date, created_at",
            EventRow::COLUMNS
        ),
        None => format!("SELECT {} FROM events ORDER BY event_date, created_at", EventRow::COLUMNS),
    };
    let mut stmt = conn.prepare(&sql)?;
    let rows = match status {
        Some(status) => stmt
            .query_map([status.as_str()], EventRow::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?,
        None => stmt
            .query_map([], EventRow::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?,
    };
    rows.into_iter().map(EventRow::into_event).collect()
}

/// Extension trait to make rusqlite's query_row return Option on no rows.
pub(crate) trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
