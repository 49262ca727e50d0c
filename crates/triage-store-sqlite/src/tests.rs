//! Integration tests for `SqliteStore` against an in-memory database.

use triage_core::{
  audit::NewAuditLog,
  id::{ChannelId, TicketId, UserId},
  store::{TICKET_COUNTER, TicketStore},
  ticket::{NewTicket, TicketStatus, TicketType},
};

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn new_ticket(n: u32, user: &str) -> NewTicket {
  NewTicket {
    ticket_id:   TicketId::from(format!("TICKET-{n}")),
    user_id:     UserId::from(user),
    channel_id:  ChannelId::from(format!("chan-{n}")),
    ticket_type: TicketType::General,
  }
}

// ─── Counter ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn counter_starts_at_one_and_increments() {
  let s = store().await;
  assert_eq!(s.next_counter(TICKET_COUNTER).await.unwrap(), 1);
  assert_eq!(s.next_counter(TICKET_COUNTER).await.unwrap(), 2);
  assert_eq!(s.next_counter(TICKET_COUNTER).await.unwrap(), 3);
}

#[tokio::test]
async fn counter_fresh_name_starts_at_one() {
  let s = store().await;
  s.next_counter(TICKET_COUNTER).await.unwrap();
  assert_eq!(s.next_counter("another_sequence").await.unwrap(), 1);
}

#[tokio::test]
async fn counter_concurrent_values_are_distinct_and_contiguous() {
  let s = store().await;

  let mut handles = Vec::new();
  for _ in 0..20 {
    let s = s.clone();
    handles.push(tokio::spawn(async move {
      s.next_counter(TICKET_COUNTER).await.unwrap()
    }));
  }

  let mut values = Vec::new();
  for handle in handles {
    values.push(handle.await.unwrap());
  }
  values.sort_unstable();

  assert_eq!(values, (1..=20).collect::<Vec<u64>>());
}

#[tokio::test]
async fn counter_continues_after_reopen() {
  let dir = tempfile::tempdir().expect("tempdir");
  let path = dir.path().join("tickets.db");

  {
    let s = SqliteStore::open(&path).await.expect("open");
    for expected in 1..=3u64 {
      assert_eq!(s.next_counter(TICKET_COUNTER).await.unwrap(), expected);
    }
  }

  let s = SqliteStore::open(&path).await.expect("reopen");
  assert_eq!(s.next_counter(TICKET_COUNTER).await.unwrap(), 4);
}

// ─── Ticket creation ─────────────────────────────────────────────────────────

#[tokio::test]
async fn create_and_get_ticket() {
  let s = store().await;

  let ticket = s.create_ticket(new_ticket(1, "user-a")).await.unwrap();
  assert_eq!(ticket.ticket_number, 1);
  assert_eq!(ticket.status, TicketStatus::Open);
  assert!(ticket.claimed_by.is_none());
  assert!(ticket.closed_at.is_none());

  let fetched = s.get_ticket(&ticket.ticket_id).await.unwrap().unwrap();
  assert_eq!(fetched.ticket_id, ticket.ticket_id);
  assert_eq!(fetched.ticket_number, 1);
  assert_eq!(fetched.ticket_type, TicketType::General);
  assert_eq!(fetched.user_id, UserId::from("user-a"));
}

#[tokio::test]
async fn get_ticket_missing_returns_none() {
  let s = store().await;
  let result = s.get_ticket(&TicketId::from("TICKET-nope")).await.unwrap();
  assert!(result.is_none());
}

#[tokio::test]
async fn ticket_numbers_are_sequential() {
  let s = store().await;
  for n in 1..=4u32 {
    let ticket = s.create_ticket(new_ticket(n, "user-a")).await.unwrap();
    assert_eq!(ticket.ticket_number, u64::from(n));
  }
}

#[tokio::test]
async fn duplicate_ticket_id_errors() {
  let s = store().await;
  s.create_ticket(new_ticket(1, "user-a")).await.unwrap();

  let err = s.create_ticket(new_ticket(1, "user-b")).await.unwrap_err();
  assert!(matches!(
    err,
    crate::Error::Core(triage_core::Error::DuplicateTicketId(_))
  ));
}

#[tokio::test]
async fn tickets_and_numbering_survive_reopen() {
  let dir = tempfile::tempdir().expect("tempdir");
  let path = dir.path().join("tickets.db");

  let first_id = {
    let s = SqliteStore::open(&path).await.expect("open");
    let first = s.create_ticket(new_ticket(1, "user-a")).await.unwrap();
    s.create_ticket(new_ticket(2, "user-a")).await.unwrap();
    first.ticket_id
  };

  let s = SqliteStore::open(&path).await.expect("reopen");
  let fetched = s.get_ticket(&first_id).await.unwrap().unwrap();
  assert_eq!(fetched.ticket_number, 1);

  // Numbering resumes from the persisted high-water mark, not from 1.
  let third = s.create_ticket(new_ticket(3, "user-a")).await.unwrap();
  assert_eq!(third.ticket_number, 3);
}

// ─── Active tickets / quota support ──────────────────────────────────────────

#[tokio::test]
async fn active_tickets_excludes_closed_but_counts_claimed() {
  let s = store().await;
  let user = UserId::from("user-a");
  let staff = UserId::from("staff-1");

  let open = s.create_ticket(new_ticket(1, "user-a")).await.unwrap();
  let claimed = s.create_ticket(new_ticket(2, "user-a")).await.unwrap();
  let closed = s.create_ticket(new_ticket(3, "user-a")).await.unwrap();
  s.create_ticket(new_ticket(4, "user-b")).await.unwrap();

  s.update_status(&claimed.ticket_id, TicketStatus::Claimed, Some(&staff))
    .await
    .unwrap();
  s.close_ticket(&closed.ticket_id).await.unwrap();

  let active = s.active_tickets_for_user(&user).await.unwrap();
  let ids: Vec<_> = active.iter().map(|t| t.ticket_id.clone()).collect();
  assert_eq!(ids, vec![open.ticket_id, claimed.ticket_id]);
}

#[tokio::test]
async fn list_open_tickets_newest_first_excludes_non_open() {
  let s = store().await;
  let staff = UserId::from("staff-1");

  let first = s.create_ticket(new_ticket(1, "user-a")).await.unwrap();
  let second = s.create_ticket(new_ticket(2, "user-b")).await.unwrap();
  let claimed = s.create_ticket(new_ticket(3, "user-c")).await.unwrap();
  s.update_status(&claimed.ticket_id, TicketStatus::Claimed, Some(&staff))
    .await
    .unwrap();

  let open = s.list_open_tickets().await.unwrap();
  let ids: Vec<_> = open.iter().map(|t| t.ticket_id.clone()).collect();
  assert_eq!(ids, vec![second.ticket_id, first.ticket_id]);
}

// ─── Claim ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn claim_sets_status_and_claimant() {
  let s = store().await;
  let staff = UserId::from("staff-1");
  let ticket = s.create_ticket(new_ticket(1, "user-a")).await.unwrap();

  let affected = s
    .update_status(&ticket.ticket_id, TicketStatus::Claimed, Some(&staff))
    .await
    .unwrap();
  assert_eq!(affected, 1);

  let fetched = s.get_ticket(&ticket.ticket_id).await.unwrap().unwrap();
  assert_eq!(fetched.status, TicketStatus::Claimed);
  assert_eq!(fetched.claimed_by, Some(staff));
}

#[tokio::test]
async fn second_claim_affects_zero_rows_and_keeps_winner() {
  let s = store().await;
  let winner = UserId::from("staff-1");
  let loser = UserId::from("staff-2");
  let ticket = s.create_ticket(new_ticket(1, "user-a")).await.unwrap();

  let first = s
    .update_status(&ticket.ticket_id, TicketStatus::Claimed, Some(&winner))
    .await
    .unwrap();
  let second = s
    .update_status(&ticket.ticket_id, TicketStatus::Claimed, Some(&loser))
    .await
    .unwrap();

  assert_eq!(first, 1);
  assert_eq!(second, 0);

  let fetched = s.get_ticket(&ticket.ticket_id).await.unwrap().unwrap();
  assert_eq!(fetched.claimed_by, Some(winner));
}

#[tokio::test]
async fn concurrent_claims_have_exactly_one_winner() {
  let s = store().await;
  let ticket = s.create_ticket(new_ticket(1, "user-a")).await.unwrap();

  let mut handles = Vec::new();
  for n in 0..8 {
    let s = s.clone();
    let id = ticket.ticket_id.clone();
    handles.push(tokio::spawn(async move {
      let staff = UserId::from(format!("staff-{n}"));
      s.update_status(&id, TicketStatus::Claimed, Some(&staff))
        .await
        .unwrap()
    }));
  }

  let mut wins = 0;
  for handle in handles {
    wins += handle.await.unwrap();
  }
  assert_eq!(wins, 1);
}

#[tokio::test]
async fn claim_requires_claimant() {
  let s = store().await;
  let ticket = s.create_ticket(new_ticket(1, "user-a")).await.unwrap();

  let err = s
    .update_status(&ticket.ticket_id, TicketStatus::Claimed, None)
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    crate::Error::Core(triage_core::Error::InvalidTransition(_))
  ));
}

#[tokio::test]
async fn cannot_claim_closed_ticket() {
  let s = store().await;
  let staff = UserId::from("staff-1");
  let ticket = s.create_ticket(new_ticket(1, "user-a")).await.unwrap();
  s.close_ticket(&ticket.ticket_id).await.unwrap();

  let affected = s
    .update_status(&ticket.ticket_id, TicketStatus::Claimed, Some(&staff))
    .await
    .unwrap();
  assert_eq!(affected, 0);
}

// ─── Close ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn close_sets_status_and_closed_at_once() {
  let s = store().await;
  let ticket = s.create_ticket(new_ticket(1, "user-a")).await.unwrap();

  assert_eq!(s.close_ticket(&ticket.ticket_id).await.unwrap(), 1);

  let closed = s.get_ticket(&ticket.ticket_id).await.unwrap().unwrap();
  assert_eq!(closed.status, TicketStatus::Closed);
  let first_closed_at = closed.closed_at.expect("closed_at set");

  // Second close is a no-op: 0 rows, closed_at untouched.
  assert_eq!(s.close_ticket(&ticket.ticket_id).await.unwrap(), 0);
  let again = s.get_ticket(&ticket.ticket_id).await.unwrap().unwrap();
  assert_eq!(again.closed_at, Some(first_closed_at));
}

#[tokio::test]
async fn close_works_from_claimed() {
  let s = store().await;
  let staff = UserId::from("staff-1");
  let ticket = s.create_ticket(new_ticket(1, "user-a")).await.unwrap();
  s.update_status(&ticket.ticket_id, TicketStatus::Claimed, Some(&staff))
    .await
    .unwrap();

  assert_eq!(s.close_ticket(&ticket.ticket_id).await.unwrap(), 1);

  // claimed_by survives the close.
  let closed = s.get_ticket(&ticket.ticket_id).await.unwrap().unwrap();
  assert_eq!(closed.claimed_by, Some(staff));
}

#[tokio::test]
async fn reopen_is_rejected() {
  let s = store().await;
  let ticket = s.create_ticket(new_ticket(1, "user-a")).await.unwrap();
  s.close_ticket(&ticket.ticket_id).await.unwrap();

  let err = s
    .update_status(&ticket.ticket_id, TicketStatus::Open, None)
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    crate::Error::Core(triage_core::Error::InvalidTransition(TicketStatus::Open))
  ));
}

// ─── Audit log ───────────────────────────────────────────────────────────────

fn log_entry(ticket: Option<&TicketId>, action: &str, details: &str) -> NewAuditLog {
  NewAuditLog {
    ticket_id: ticket.cloned(),
    action:    action.to_owned(),
    user_id:   Some(UserId::from("user-a")),
    details:   details.to_owned(),
  }
}

#[tokio::test]
async fn audit_log_newest_first_matches_insertion_order() {
  let s = store().await;
  let id = TicketId::from("TICKET-1");

  for action in ["ticket:create", "ticket:claim", "ticket:close"] {
    s.append_audit_log(log_entry(Some(&id), action, "step"))
      .await
      .unwrap();
  }

  let logs = s.list_audit_logs(id.as_str()).await.unwrap();
  let actions: Vec<_> = logs.iter().map(|l| l.action.as_str()).collect();
  assert_eq!(actions, vec!["ticket:close", "ticket:claim", "ticket:create"]);
}

#[tokio::test]
async fn audit_log_substitutes_system_sentinel() {
  let s = store().await;

  let log_id = s
    .append_audit_log(NewAuditLog {
      ticket_id: None,
      action:    "system:startup".to_owned(),
      user_id:   None,
      details:   "service started".to_owned(),
    })
    .await
    .unwrap();
  assert!(log_id > 0);

  let logs = s.list_audit_logs("system").await.unwrap();
  assert_eq!(logs.len(), 1);
  assert_eq!(logs[0].ticket_id, "system");
  assert_eq!(logs[0].user_id, "system");
}

#[tokio::test]
async fn audit_logs_scoped_to_ticket() {
  let s = store().await;
  let a = TicketId::from("TICKET-1");
  let b = TicketId::from("TICKET-2");

  s.append_audit_log(log_entry(Some(&a), "ticket:create", "a"))
    .await
    .unwrap();
  s.append_audit_log(log_entry(Some(&b), "ticket:create", "b"))
    .await
    .unwrap();

  let logs = s.list_audit_logs(a.as_str()).await.unwrap();
  assert_eq!(logs.len(), 1);
  assert_eq!(logs[0].details, "a");
}
