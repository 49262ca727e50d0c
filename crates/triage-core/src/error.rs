//! Error taxonomy for the ticket service.

use thiserror::Error;

use crate::{
  gateway::GatewayError,
  id::{ChannelId, TicketId, UserId},
  ticket::TicketStatus,
};

#[derive(Debug, Error)]
pub enum Error {
  #[error("ticket not found: {0}")]
  TicketNotFound(TicketId),

  #[error("channel not found: {0}")]
  ChannelNotFound(ChannelId),

  #[error("ticket id already exists: {0}")]
  DuplicateTicketId(TicketId),

  #[error("ticket {ticket_id} is already claimed by {claimed_by}")]
  AlreadyClaimed {
    ticket_id:  TicketId,
    claimed_by: UserId,
  },

  #[error("user already holds {limit} active tickets")]
  QuotaExceeded { limit: usize },

  #[error("no valid transition to status {0:?}")]
  InvalidTransition(TicketStatus),

  #[error("unknown ticket type: {0:?}")]
  UnknownTicketType(String),

  /// The backing store is unreachable or returned a malformed row.
  #[error("storage unavailable: {0}")]
  Storage(String),

  #[error("gateway error: {0}")]
  Gateway(#[from] GatewayError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
