use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 =
        conn.query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))?;

    if version < 1 {
        info!("Running migration v1 (profiles, tickets, events)");
        conn.execute_batch(
            "
            CREATE TABLE profiles (
                id              TEXT PRIMARY KEY,
                username        TEXT NOT NULL UNIQUE,
                password        TEXT NOT NULL,
                role            TEXT NOT NULL,
                display_name    TEXT NOT NULL,
                address         TEXT NOT NULL DEFAULT '',
                district        TEXT NOT NULL DEFAULT '',
                created_at      TEXT NOT NULL
            );

            CREATE TABLE tickets (
                id              TEXT PRIMARY KEY,
                requester_id    TEXT NOT NULL UNIQUE REFERENCES profiles(id),
                display_name    TEXT NOT NULL,
                account_number  TEXT NOT NULL DEFAULT '',
                ifsc_code       TEXT NOT NULL DEFAULT '',
                description     TEXT NOT NULL DEFAULT '',
                status          TEXT NOT NULL,
                version         INTEGER NOT NULL DEFAULT 1,
                created_at      TEXT NOT NULL,
                updated_at      TEXT NOT NULL
            );

            CREATE INDEX idx_tickets_status ON tickets(status);

            CREATE TABLE events (
                id                  TEXT PRIMARY KEY,
                author_id           TEXT NOT NULL REFERENCES profiles(id),
                title               TEXT NOT NULL,
                event_date          TEXT NOT NULL,
                venue               TEXT NOT NULL,
                status              TEXT NOT NULL DEFAULT 'scheduled',
                total_attendees     INTEGER,
                students_verified   INTEGER,
                summary             TEXT,
                reported_at         TEXT,
                created_at          TEXT NOT NULL
            );

            CREATE INDEX idx_events_status ON events(status, event_date);

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    if version < 2 {
        info!("Running migration v2 (ticket history)");
        conn.execute_batch(
            "
            CREATE TABLE ticket_history (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                ticket_id   TEXT NOT NULL REFERENCES tickets(id),
                action      TEXT NOT NULL,
                from_status TEXT NOT NULL,
                to_status   TEXT NOT NULL,
                actor_id    TEXT NOT NULL,
                version     INTEGER NOT NULL,
                at          TEXT NOT NULL
            );

            CREATE INDEX idx_ticket_history_ticket ON ticket_history(ticket_id, id);

            INSERT INTO schema_version (version) VALUES (2);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run(&conn).unwrap();
        run(&conn).unwrap();

        let version: i64 = conn
            .query_row("SELECT MAX(version) FROM schema_version", [], |r| r.get(0))
            .unwrap();
        assert_eq!(version, 2);
    }
}
