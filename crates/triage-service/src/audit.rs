//! The audit fan-out sink.
//!
//! Every lifecycle-relevant action is recorded twice: a durable row in
//! the store's append-only log (for ticket-scoped events), and a
//! best-effort notification to the configured log channel. The
//! notification channel is optional and frequently unavailable, so
//! failures there are written to the diagnostic stream and never
//! propagate to the caller.

use std::sync::Arc;

use triage_core::{
  audit::NewAuditLog,
  gateway::{Gateway, Notice, OutboundMessage, Tone},
  id::{ChannelId, TicketId, UserId},
  store::TicketStore,
  ticket::Ticket,
};

// ─── Events ──────────────────────────────────────────────────────────────────

/// Category half of the composite `{type}:{action}` tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditKind {
  Ticket,
  Command,
  Interaction,
  Error,
  System,
}

impl AuditKind {
  pub fn as_str(self) -> &'static str {
    match self {
      AuditKind::Ticket => "ticket",
      AuditKind::Command => "command",
      AuditKind::Interaction => "interaction",
      AuditKind::Error => "error",
      AuditKind::System => "system",
    }
  }
}

/// A structured event flowing into the audit sink.
#[derive(Debug, Clone)]
pub struct AuditEvent {
  pub kind:       AuditKind,
  pub action:     String,
  pub actor:      Option<UserId>,
  pub ticket_id:  Option<TicketId>,
  pub channel_id: Option<ChannelId>,
  pub details:    String,
  pub tone:       Tone,
}

impl AuditEvent {
  /// A ticket lifecycle event; always persisted.
  pub fn ticket(action: &str, actor: &UserId, ticket: &Ticket, details: impl Into<String>) -> Self {
    let tone = match action {
      "create" => Tone::Success,
      "close" => Tone::Danger,
      "claim" => Tone::Warning,
      _ => Tone::Neutral,
    };
    Self {
      kind: AuditKind::Ticket,
      action: action.to_owned(),
      actor: Some(actor.clone()),
      ticket_id: Some(ticket.ticket_id.clone()),
      channel_id: Some(ticket.channel_id.clone()),
      details: details.into(),
      tone,
    }
  }

  /// A non-ticket interaction (button press, rejected attempt).
  /// Persisted only when a ticket is attached via
  /// [`AuditEvent::with_ticket`].
  pub fn interaction(
    action: &str,
    actor: &UserId,
    details: impl Into<String>,
    channel: Option<ChannelId>,
  ) -> Self {
    Self {
      kind: AuditKind::Interaction,
      action: action.to_owned(),
      actor: Some(actor.clone()),
      ticket_id: None,
      channel_id: channel,
      details: details.into(),
      tone: Tone::Neutral,
    }
  }

  /// A slash-command execution.
  pub fn command(name: &str, actor: &UserId, details: impl Into<String>) -> Self {
    Self {
      kind: AuditKind::Command,
      action: "execute".to_owned(),
      actor: Some(actor.clone()),
      ticket_id: None,
      channel_id: None,
      details: format!("Command: {name}\n{}", details.into()),
      tone: Tone::Success,
    }
  }

  /// A handled failure.
  pub fn error(actor: Option<UserId>, details: impl Into<String>) -> Self {
    Self {
      kind: AuditKind::Error,
      action: "occurred".to_owned(),
      actor,
      ticket_id: None,
      channel_id: None,
      details: details.into(),
      tone: Tone::Danger,
    }
  }

  /// A service-level event not attributable to any user.
  pub fn system(action: &str, details: impl Into<String>) -> Self {
    Self {
      kind: AuditKind::System,
      action: action.to_owned(),
      actor: None,
      ticket_id: None,
      channel_id: None,
      details: details.into(),
      tone: Tone::Success,
    }
  }

  pub fn with_ticket(mut self, ticket_id: TicketId) -> Self {
    self.ticket_id = Some(ticket_id);
    self
  }

  /// The composite tag stored in the `action` column.
  pub fn tag(&self) -> String {
    format!("{}:{}", self.kind.as_str(), self.action)
  }

  fn notice(&self) -> Notice {
    let title = format!(
      "{} {}",
      capitalize(self.kind.as_str()),
      capitalize(&self.action)
    );
    let mut notice = Notice::new(title, self.details.clone(), self.tone);
    if let Some(actor) = &self.actor {
      notice = notice.field("User", actor.to_string());
    }
    if let Some(ticket_id) = &self.ticket_id {
      notice = notice.field("Ticket ID", ticket_id.to_string());
    }
    if let Some(channel_id) = &self.channel_id {
      notice = notice.field("Channel", channel_id.to_string());
    }
    notice
  }
}

fn capitalize(s: &str) -> String {
  let mut chars = s.chars();
  match chars.next() {
    Some(first) => first.to_uppercase().chain(chars).collect(),
    None => String::new(),
  }
}

// ─── Sink ────────────────────────────────────────────────────────────────────

/// Fan-out: durable audit row + best-effort log-channel notification.
pub struct AuditLogger<S, G> {
  store:       S,
  gateway:     Arc<G>,
  log_channel: Option<ChannelId>,
}

impl<S, G> AuditLogger<S, G>
where
  S: TicketStore,
  G: Gateway,
{
  pub fn new(store: S, gateway: Arc<G>, log_channel: Option<ChannelId>) -> Self {
    Self { store, gateway, log_channel }
  }

  /// Record an event. Never fails: storage and delivery problems are
  /// reported on the diagnostic stream only.
  pub async fn record(&self, event: AuditEvent) {
    let tag = event.tag();

    if matches!(event.kind, AuditKind::Ticket) || event.ticket_id.is_some() {
      let entry = NewAuditLog {
        ticket_id: event.ticket_id.clone(),
        action:    tag.clone(),
        user_id:   event.actor.clone(),
        details:   event.details.clone(),
      };
      if let Err(e) = self.store.append_audit_log(entry).await {
        tracing::warn!(action = %tag, error = %e, "failed to append audit log");
      }
    }

    if let Some(channel) = &self.log_channel {
      let message = OutboundMessage::notice(event.notice());
      if let Err(e) = self.gateway.send_message(channel, &message).await {
        tracing::warn!(action = %tag, error = %e, "failed to send audit notification");
      }
    }

    tracing::info!(action = %tag, "{}", event.details);
  }
}
