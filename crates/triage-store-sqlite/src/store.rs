//! [`SqliteStore`] — the SQLite implementation of [`TicketStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;

use triage_core::{
  audit::{AuditLogEntry, NewAuditLog, SYSTEM_SENTINEL},
  id::{TicketId, UserId},
  store::{TICKET_COUNTER, TicketStore},
  ticket::{NewTicket, Ticket, TicketStatus},
};

use crate::{
  Error, Result,
  encode::{RawAuditLog, RawTicket, encode_dt, encode_status, encode_ticket_type},
  schema::{self, SCHEMA},
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A ticket store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted. All
/// state transitions are single conditional UPDATEs, so concurrent
/// handlers cannot race each other into claiming or closing the same
/// ticket twice.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        schema::migrate(conn)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Insert a fully-built [`Ticket`] row. A UNIQUE violation on
  /// `ticket_id` maps to `DuplicateTicketId` — the id pre-check in
  /// `create_ticket` can lose a same-millisecond race.
  async fn insert_ticket(&self, ticket: &Ticket) -> Result<()> {
    let ticket_id_str = ticket.ticket_id.to_string();
    let number = ticket.ticket_number as i64;
    let user_id_str = ticket.user_id.to_string();
    let channel_id_str = ticket.channel_id.to_string();
    let type_str = encode_ticket_type(ticket.ticket_type).to_owned();
    let status_str = encode_status(ticket.status).to_owned();
    let created_at_str = encode_dt(ticket.created_at);

    let result = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO tickets (
             ticket_id, ticket_number, user_id, channel_id,
             type, status, claimed_by, created_at, closed_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, NULL, ?7, NULL)",
          rusqlite::params![
            ticket_id_str,
            number,
            user_id_str,
            channel_id_str,
            type_str,
            status_str,
            created_at_str,
          ],
        )?;
        Ok(())
      })
      .await;

    match result {
      Ok(()) => Ok(()),
      Err(tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(
        e,
        Some(ref message),
      ))) if e.code == rusqlite::ErrorCode::ConstraintViolation
        && message.contains("tickets.ticket_id") =>
      {
        Err(Error::Core(triage_core::Error::DuplicateTicketId(
          ticket.ticket_id.clone(),
        )))
      }
      Err(e) => Err(e.into()),
    }
  }

  async fn query_tickets(
    &self,
    sql: &'static str,
    param: Option<String>,
  ) -> Result<Vec<Ticket>> {
    let raws: Vec<RawTicket> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(sql)?;
        let rows = if let Some(p) = param {
          stmt
            .query_map(rusqlite::params![p], RawTicket::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        } else {
          stmt
            .query_map([], RawTicket::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawTicket::into_ticket).collect()
  }
}

// ─── TicketStore impl ────────────────────────────────────────────────────────

impl TicketStore for SqliteStore {
  type Error = Error;

  // ── Counters ──────────────────────────────────────────────────────────────

  async fn next_counter(&self, name: &str) -> Result<u64> {
    let name = name.to_owned();

    // A single upsert: atomic per name, so concurrent callers each see
    // a distinct value.
    let value: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "INSERT INTO counters (name, value) VALUES (?1, 1)
           ON CONFLICT(name) DO UPDATE SET value = value + 1
           RETURNING value",
          rusqlite::params![name],
          |row| row.get(0),
        )?)
      })
      .await?;

    Ok(value as u64)
  }

  // ── Tickets ───────────────────────────────────────────────────────────────

  async fn create_ticket(&self, input: NewTicket) -> Result<Ticket> {
    if self.get_ticket(&input.ticket_id).await?.is_some() {
      return Err(Error::Core(triage_core::Error::DuplicateTicketId(
        input.ticket_id,
      )));
    }

    let ticket_number = self.next_counter(TICKET_COUNTER).await?;

    let ticket = Ticket {
      ticket_id: input.ticket_id,
      ticket_number,
      user_id: input.user_id,
      channel_id: input.channel_id,
      ticket_type: input.ticket_type,
      status: TicketStatus::Open,
      claimed_by: None,
      created_at: Utc::now(),
      closed_at: None,
    };

    self.insert_ticket(&ticket).await?;
    Ok(ticket)
  }

  async fn get_ticket(&self, id: &TicketId) -> Result<Option<Ticket>> {
    let id_str = id.to_string();

    let raw: Option<RawTicket> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {} FROM tickets WHERE ticket_id = ?1",
                RawTicket::COLUMNS
              ),
              rusqlite::params![id_str],
              RawTicket::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawTicket::into_ticket).transpose()
  }

  async fn active_tickets_for_user(&self, user: &UserId) -> Result<Vec<Ticket>> {
    self
      .query_tickets(
        "SELECT ticket_id, ticket_number, user_id, channel_id, type, status, \
         claimed_by, created_at, closed_at \
         FROM tickets WHERE user_id = ?1 AND status != 'closed' \
         ORDER BY created_at ASC",
        Some(user.to_string()),
      )
      .await
  }

  async fn list_open_tickets(&self) -> Result<Vec<Ticket>> {
    self
      .query_tickets(
        "SELECT ticket_id, ticket_number, user_id, channel_id, type, status, \
         claimed_by, created_at, closed_at \
         FROM tickets WHERE status = 'open' \
         ORDER BY created_at DESC, id DESC",
        None,
      )
      .await
  }

  async fn update_status(
    &self,
    id: &TicketId,
    new_status: TicketStatus,
    claimed_by: Option<&UserId>,
  ) -> Result<u64> {
    let id_str = id.to_string();

    let affected: usize = match new_status {
      TicketStatus::Claimed => {
        let claimer = claimed_by
          .ok_or(Error::Core(triage_core::Error::InvalidTransition(
            TicketStatus::Claimed,
          )))?
          .to_string();

        // Claim-if-unclaimed as one conditional update; the loser of a
        // concurrent claim affects 0 rows.
        self
          .conn
          .call(move |conn| {
            Ok(conn.execute(
              "UPDATE tickets SET status = 'claimed', claimed_by = ?1
               WHERE ticket_id = ?2 AND status = 'open' AND claimed_by IS NULL",
              rusqlite::params![claimer, id_str],
            )?)
          })
          .await?
      }

      TicketStatus::Closed => {
        let closed_at_str = encode_dt(Utc::now());

        self
          .conn
          .call(move |conn| {
            Ok(conn.execute(
              "UPDATE tickets SET status = 'closed', closed_at = ?1
               WHERE ticket_id = ?2 AND status != 'closed'",
              rusqlite::params![closed_at_str, id_str],
            )?)
          })
          .await?
      }

      TicketStatus::Open => {
        return Err(Error::Core(triage_core::Error::InvalidTransition(
          TicketStatus::Open,
        )));
      }
    };

    Ok(affected as u64)
  }

  async fn close_ticket(&self, id: &TicketId) -> Result<u64> {
    self.update_status(id, TicketStatus::Closed, None).await
  }

  // ── Audit log ─────────────────────────────────────────────────────────────

  async fn append_audit_log(&self, entry: NewAuditLog) -> Result<i64> {
    let ticket_id_str = entry
      .ticket_id
      .map(|t| t.to_string())
      .unwrap_or_else(|| SYSTEM_SENTINEL.to_owned());
    let user_id_str = entry
      .user_id
      .map(|u| u.to_string())
      .unwrap_or_else(|| SYSTEM_SENTINEL.to_owned());
    let action = entry.action;
    let details = entry.details;
    let created_at_str = encode_dt(Utc::now());

    let log_id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO ticket_logs (ticket_id, action, user_id, details, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![ticket_id_str, action, user_id_str, details, created_at_str],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(log_id)
  }

  async fn list_audit_logs(&self, ticket_id: &str) -> Result<Vec<AuditLogEntry>> {
    let ticket_id = ticket_id.to_owned();

    let raws: Vec<RawAuditLog> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {} FROM ticket_logs WHERE ticket_id = ?1
           ORDER BY created_at DESC, id DESC",
          RawAuditLog::COLUMNS
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![ticket_id], RawAuditLog::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawAuditLog::into_entry).collect()
  }
}
