//! Ticket records and their small, fixed lifecycle.
//!
//! A ticket is opened from a type selection, optionally claimed by one
//! staff member, and eventually closed. Closed is terminal; rows are
//! retained for history and never deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  error::Error,
  gateway::Tone,
  id::{ChannelId, TicketId, UserId},
};

/// A user may hold at most this many non-closed tickets at once.
pub const MAX_ACTIVE_TICKETS: usize = 3;

// ─── Ticket type ─────────────────────────────────────────────────────────────

/// The fixed set of ticket categories a user can pick from the menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketType {
  General,
  Technical,
  Billing,
  Bug,
}

impl TicketType {
  pub const ALL: [TicketType; 4] = [
    TicketType::General,
    TicketType::Technical,
    TicketType::Billing,
    TicketType::Bug,
  ];

  pub fn as_str(self) -> &'static str {
    match self {
      TicketType::General => "general",
      TicketType::Technical => "technical",
      TicketType::Billing => "billing",
      TicketType::Bug => "bug",
    }
  }

  pub fn parse(s: &str) -> Result<Self, Error> {
    match s {
      "general" => Ok(TicketType::General),
      "technical" => Ok(TicketType::Technical),
      "billing" => Ok(TicketType::Billing),
      "bug" => Ok(TicketType::Bug),
      other => Err(Error::UnknownTicketType(other.to_owned())),
    }
  }

  pub fn label(self) -> &'static str {
    match self {
      TicketType::General => "General Support",
      TicketType::Technical => "Technical Support",
      TicketType::Billing => "Billing Support",
      TicketType::Bug => "Bug Report",
    }
  }

  pub fn description(self) -> &'static str {
    match self {
      TicketType::General => "Get help with general questions",
      TicketType::Technical => "Get help with technical issues",
      TicketType::Billing => "Get help with billing issues",
      TicketType::Bug => "Report a bug or issue",
    }
  }

  /// Styling hint forwarded to the gateway when displaying this type.
  pub fn tone(self) -> Tone {
    match self {
      TicketType::General => Tone::Neutral,
      TicketType::Technical => Tone::Danger,
      TicketType::Billing => Tone::Success,
      TicketType::Bug => Tone::Warning,
    }
  }
}

// ─── Status ──────────────────────────────────────────────────────────────────

/// Lifecycle state. `open` and `claimed` count as active; `closed` is
/// terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketStatus {
  Open,
  Claimed,
  Closed,
}

impl TicketStatus {
  pub fn as_str(self) -> &'static str {
    match self {
      TicketStatus::Open => "open",
      TicketStatus::Claimed => "claimed",
      TicketStatus::Closed => "closed",
    }
  }

  pub fn is_active(self) -> bool { !matches!(self, TicketStatus::Closed) }
}

// ─── Records ─────────────────────────────────────────────────────────────────

/// A persisted ticket row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
  pub ticket_id:     TicketId,
  /// Strictly increasing, assigned once from the counter store.
  pub ticket_number: u64,
  pub user_id:       UserId,
  pub channel_id:    ChannelId,
  pub ticket_type:   TicketType,
  pub status:        TicketStatus,
  /// Set exactly once when the ticket is claimed; never reset.
  pub claimed_by:    Option<UserId>,
  pub created_at:    DateTime<Utc>,
  /// Set if and only if `status` is `Closed`.
  pub closed_at:     Option<DateTime<Utc>>,
}

/// Input for [`crate::store::TicketStore::create_ticket`]. The number,
/// status, and timestamps are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewTicket {
  pub ticket_id:   TicketId,
  pub user_id:     UserId,
  pub channel_id:  ChannelId,
  pub ticket_type: TicketType,
}
