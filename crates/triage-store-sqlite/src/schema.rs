//! SQL schema for the ticket store.
//!
//! The DDL is idempotent (`CREATE TABLE IF NOT EXISTS`), and
//! [`migrate`] upgrades databases created by earlier versions by adding
//! missing columns. Migrations are strictly additive; existing rows are
//! never destroyed.

use rusqlite::Connection;

/// Full schema DDL, executed at every connection startup.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS tickets (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    ticket_id     TEXT NOT NULL UNIQUE,
    ticket_number INTEGER NOT NULL UNIQUE,
    user_id       TEXT NOT NULL,
    channel_id    TEXT NOT NULL,
    type          TEXT NOT NULL,   -- 'general' | 'technical' | 'billing' | 'bug'
    status        TEXT NOT NULL DEFAULT 'open',
    claimed_by    TEXT,
    created_at    TEXT NOT NULL,   -- RFC 3339 UTC; server-assigned
    closed_at     TEXT             -- set exactly once on close
);

-- Audit trail. Strictly append-only: no UPDATE or DELETE is ever
-- issued against this table.
CREATE TABLE IF NOT EXISTS ticket_logs (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    ticket_id  TEXT NOT NULL,      -- ticket reference or 'system'
    action     TEXT NOT NULL,      -- composite '{type}:{action}' tag
    user_id    TEXT NOT NULL,      -- actor or 'system'
    details    TEXT NOT NULL,
    created_at TEXT NOT NULL
);

-- Named monotonic sequences. The ticket sequence row is seeded at 0 so
-- the first increment hands out 1.
CREATE TABLE IF NOT EXISTS counters (
    name  TEXT PRIMARY KEY,
    value INTEGER NOT NULL DEFAULT 0
);

INSERT OR IGNORE INTO counters (name, value) VALUES ('ticket_counter', 0);

CREATE INDEX IF NOT EXISTS tickets_user_idx       ON tickets(user_id);
CREATE INDEX IF NOT EXISTS tickets_status_idx     ON tickets(status);
CREATE INDEX IF NOT EXISTS ticket_logs_ticket_idx ON ticket_logs(ticket_id);
";

/// Columns added after the first released schema. Databases created
/// before them lack the columns entirely.
const ADDITIVE_COLUMNS: [(&str, &str); 2] = [
  ("ticket_number", "ALTER TABLE tickets ADD COLUMN ticket_number INTEGER"),
  ("claimed_by", "ALTER TABLE tickets ADD COLUMN claimed_by TEXT"),
];

/// Bring an existing `tickets` table up to the current column set.
pub fn migrate(conn: &Connection) -> rusqlite::Result<()> {
  let mut stmt = conn.prepare("PRAGMA table_info(tickets)")?;
  let existing: Vec<String> = stmt
    .query_map([], |row| row.get::<_, String>(1))?
    .collect::<rusqlite::Result<_>>()?;

  for (column, ddl) in ADDITIVE_COLUMNS {
    if !existing.iter().any(|c| c == column) {
      tracing::info!(column, "adding missing column to tickets table");
      conn.execute(ddl, [])?;
    }
  }

  Ok(())
}
