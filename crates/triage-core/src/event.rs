//! Tagged interaction events.
//!
//! The adapter parses raw component ids into [`CustomId`] variants once
//! at its boundary; handler code dispatches on typed variants and never
//! inspects id prefixes. [`CustomId`] also renders the wire string when
//! the service builds buttons and menus.

use crate::id::{ChannelId, InteractionId, TicketId, UserId};

// ─── Component ids ───────────────────────────────────────────────────────────

/// Typed form of a component-id wire string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CustomId {
  /// The "open a ticket" button on the panel message.
  CreateTicket,
  /// The ticket-type select menu.
  TypeSelect,
  CloseTicket(TicketId),
  ConfirmClose(TicketId),
  CancelClose,
  ClaimTicket(TicketId),
  Transcript(TicketId),
}

impl CustomId {
  /// Parse a wire string. Returns `None` for ids this service does not
  /// own, so foreign components are ignored rather than rejected.
  pub fn parse(raw: &str) -> Option<Self> {
    match raw {
      "create_ticket" => return Some(CustomId::CreateTicket),
      "ticket_type" => return Some(CustomId::TypeSelect),
      "cancel_close" => return Some(CustomId::CancelClose),
      _ => {}
    }
    if let Some(id) = raw.strip_prefix("close_ticket_") {
      return Some(CustomId::CloseTicket(TicketId::from(id)));
    }
    if let Some(id) = raw.strip_prefix("confirm_close_") {
      return Some(CustomId::ConfirmClose(TicketId::from(id)));
    }
    if let Some(id) = raw.strip_prefix("claim_ticket_") {
      return Some(CustomId::ClaimTicket(TicketId::from(id)));
    }
    if let Some(id) = raw.strip_prefix("transcript_") {
      return Some(CustomId::Transcript(TicketId::from(id)));
    }
    None
  }

  /// Render the wire string for outbound components.
  pub fn render(&self) -> String {
    match self {
      CustomId::CreateTicket => "create_ticket".to_owned(),
      CustomId::TypeSelect => "ticket_type".to_owned(),
      CustomId::CancelClose => "cancel_close".to_owned(),
      CustomId::CloseTicket(id) => format!("close_ticket_{id}"),
      CustomId::ConfirmClose(id) => format!("confirm_close_{id}"),
      CustomId::ClaimTicket(id) => format!("claim_ticket_{id}"),
      CustomId::Transcript(id) => format!("transcript_{id}"),
    }
  }
}

impl std::fmt::Display for CustomId {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(&self.render())
  }
}

// ─── Events ──────────────────────────────────────────────────────────────────

/// What kind of interaction arrived, with its parsed payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventPayload {
  /// A slash-command invocation.
  Command { name: String },
  /// A button press.
  Button(CustomId),
  /// A select-menu choice.
  Select { menu: CustomId, value: String },
}

/// One inbound interaction, as delivered by the gateway adapter.
#[derive(Debug, Clone)]
pub struct InteractionEvent {
  pub interaction: InteractionId,
  pub actor:       UserId,
  /// Channel the interaction originated in.
  pub channel:     ChannelId,
  pub payload:     EventPayload,
}
