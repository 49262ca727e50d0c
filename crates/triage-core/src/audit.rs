//! Audit log records — append-only, never mutated or deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::{TicketId, UserId};

/// Stored in the `ticket_id`/`user_id` columns when an entry is not
/// attributable to a ticket or an actor.
pub const SYSTEM_SENTINEL: &str = "system";

/// A persisted audit row. `action` is a composite `{type}:{action}`
/// tag, e.g. `ticket:close`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogEntry {
  pub log_id:     i64,
  pub ticket_id:  String,
  pub action:     String,
  pub user_id:    String,
  pub details:    String,
  pub created_at: DateTime<Utc>,
}

/// Input for [`crate::store::TicketStore::append_audit_log`]. Missing
/// references are replaced with [`SYSTEM_SENTINEL`] on insertion.
#[derive(Debug, Clone)]
pub struct NewAuditLog {
  pub ticket_id: Option<TicketId>,
  pub action:    String,
  pub user_id:   Option<UserId>,
  pub details:   String,
}
