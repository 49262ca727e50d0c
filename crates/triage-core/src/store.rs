//! The `TicketStore` trait — durable tickets, audit log, and counters.
//!
//! Implemented by storage backends (e.g. `triage-store-sqlite`). The
//! lifecycle controller depends on this abstraction, not on any
//! concrete backend.

use std::future::Future;

use crate::{
  audit::{AuditLogEntry, NewAuditLog},
  id::{TicketId, UserId},
  ticket::{NewTicket, Ticket, TicketStatus},
};

/// Name of the sequence that numbers tickets.
pub const TICKET_COUNTER: &str = "ticket_counter";

/// Abstraction over the ticket store backend.
///
/// Mutations are single-row conditional operations; callers never issue
/// read-then-write sequences for state transitions. `update_status` and
/// `close_ticket` return the number of rows affected so callers can
/// detect a lost race (0 rows) without a second query racing the first.
pub trait TicketStore: Send + Sync {
  type Error: std::error::Error
    + Into<crate::Error>
    + Send
    + Sync
    + 'static;

  // ── Counters ──────────────────────────────────────────────────────────

  /// Return the next value of the named sequence: strictly increasing
  /// from 1 for a fresh name, atomic per name, persisted across
  /// restarts. No two callers ever observe the same value.
  fn next_counter<'a>(
    &'a self,
    name: &'a str,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + 'a;

  // ── Tickets ───────────────────────────────────────────────────────────

  /// Obtain the next ticket number and persist a new open, unclaimed
  /// ticket. Fails with `DuplicateTicketId` if the id is taken.
  fn create_ticket(
    &self,
    input: NewTicket,
  ) -> impl Future<Output = Result<Ticket, Self::Error>> + Send + '_;

  /// Retrieve a ticket by id. Returns `None` if not found.
  fn get_ticket<'a>(
    &'a self,
    id: &'a TicketId,
  ) -> impl Future<Output = Result<Option<Ticket>, Self::Error>> + Send + 'a;

  /// All tickets held by `user` whose status is not closed.
  fn active_tickets_for_user<'a>(
    &'a self,
    user: &'a UserId,
  ) -> impl Future<Output = Result<Vec<Ticket>, Self::Error>> + Send + 'a;

  /// All open tickets, newest first.
  fn list_open_tickets(
    &self,
  ) -> impl Future<Output = Result<Vec<Ticket>, Self::Error>> + Send + '_;

  /// Conditionally transition a ticket as a single atomic update:
  ///
  /// - to `Claimed` (with `claimed_by` set): only from `Open` with no
  ///   claimant — the losing side of a claim race affects 0 rows;
  /// - to `Closed`: from any non-closed status, setting `closed_at` —
  ///   a repeated close affects 0 rows;
  /// - to `Open`: rejected; nothing re-opens a ticket.
  fn update_status<'a>(
    &'a self,
    id: &'a TicketId,
    new_status: TicketStatus,
    claimed_by: Option<&'a UserId>,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + 'a;

  /// Shorthand for `update_status(id, Closed, None)`.
  fn close_ticket<'a>(
    &'a self,
    id: &'a TicketId,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + 'a;

  // ── Audit log ─────────────────────────────────────────────────────────

  /// Append an audit entry and return its row id. Missing references
  /// are stored as the `"system"` sentinel.
  fn append_audit_log(
    &self,
    entry: NewAuditLog,
  ) -> impl Future<Output = Result<i64, Self::Error>> + Send + '_;

  /// All audit entries for a ticket id (or the sentinel), newest first.
  fn list_audit_logs<'a>(
    &'a self,
    ticket_id: &'a str,
  ) -> impl Future<Output = Result<Vec<AuditLogEntry>, Self::Error>> + Send + 'a;
}
