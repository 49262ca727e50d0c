//! Encoding and decoding helpers between Rust domain types and the
//! plain-text representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings; enums as their lowercase
//! discriminants.

use chrono::{DateTime, Utc};
use triage_core::{
  audit::AuditLogEntry,
  id::{ChannelId, TicketId, UserId},
  ticket::{Ticket, TicketStatus, TicketType},
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── TicketStatus ────────────────────────────────────────────────────────────

pub fn encode_status(s: TicketStatus) -> &'static str { s.as_str() }

pub fn decode_status(s: &str) -> Result<TicketStatus> {
  match s {
    "open" => Ok(TicketStatus::Open),
    "claimed" => Ok(TicketStatus::Claimed),
    "closed" => Ok(TicketStatus::Closed),
    other => Err(Error::Decode(format!("unknown ticket status: {other:?}"))),
  }
}

// ─── TicketType ──────────────────────────────────────────────────────────────

pub fn encode_ticket_type(t: TicketType) -> &'static str { t.as_str() }

pub fn decode_ticket_type(s: &str) -> Result<TicketType> {
  TicketType::parse(s).map_err(|_| Error::Decode(format!("unknown ticket type: {s:?}")))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `tickets` row.
pub struct RawTicket {
  pub ticket_id:     String,
  pub ticket_number: i64,
  pub user_id:       String,
  pub channel_id:    String,
  pub ticket_type:   String,
  pub status:        String,
  pub claimed_by:    Option<String>,
  pub created_at:    String,
  pub closed_at:     Option<String>,
}

impl RawTicket {
  /// Column list matching the field order of [`RawTicket::from_row`].
  pub const COLUMNS: &'static str = "ticket_id, ticket_number, user_id, \
     channel_id, type, status, claimed_by, created_at, closed_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(RawTicket {
      ticket_id:     row.get(0)?,
      ticket_number: row.get(1)?,
      user_id:       row.get(2)?,
      channel_id:    row.get(3)?,
      ticket_type:   row.get(4)?,
      status:        row.get(5)?,
      claimed_by:    row.get(6)?,
      created_at:    row.get(7)?,
      closed_at:     row.get(8)?,
    })
  }

  pub fn into_ticket(self) -> Result<Ticket> {
    Ok(Ticket {
      ticket_id:     TicketId::from(self.ticket_id),
      ticket_number: u64::try_from(self.ticket_number)
        .map_err(|_| Error::Decode(format!("negative ticket number: {}", self.ticket_number)))?,
      user_id:       UserId::from(self.user_id),
      channel_id:    ChannelId::from(self.channel_id),
      ticket_type:   decode_ticket_type(&self.ticket_type)?,
      status:        decode_status(&self.status)?,
      claimed_by:    self.claimed_by.map(UserId::from),
      created_at:    decode_dt(&self.created_at)?,
      closed_at:     self.closed_at.as_deref().map(decode_dt).transpose()?,
    })
  }
}

/// Raw strings read directly from a `ticket_logs` row.
pub struct RawAuditLog {
  pub log_id:     i64,
  pub ticket_id:  String,
  pub action:     String,
  pub user_id:    String,
  pub details:    String,
  pub created_at: String,
}

impl RawAuditLog {
  pub const COLUMNS: &'static str =
    "id, ticket_id, action, user_id, details, created_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(RawAuditLog {
      log_id:     row.get(0)?,
      ticket_id:  row.get(1)?,
      action:     row.get(2)?,
      user_id:    row.get(3)?,
      details:    row.get(4)?,
      created_at: row.get(5)?,
    })
  }

  pub fn into_entry(self) -> Result<AuditLogEntry> {
    Ok(AuditLogEntry {
      log_id:     self.log_id,
      ticket_id:  self.ticket_id,
      action:     self.action,
      user_id:    self.user_id,
      details:    self.details,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}
