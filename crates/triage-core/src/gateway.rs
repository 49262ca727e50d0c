//! The `Gateway` trait and its message types.
//!
//! The gateway is the external chat-platform connection: it delivers
//! already-parsed interaction events and accepts display and
//! channel-management requests. This crate never renders embeds or
//! speaks the wire protocol — outbound content is expressed as neutral
//! notices with styling hints, and the adapter decides how they look.

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::id::{ChannelId, InteractionId, UserId};

// ─── Errors ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Error)]
pub enum GatewayError {
  #[error("channel not found: {0}")]
  ChannelNotFound(ChannelId),

  #[error("user not found: {0}")]
  UserNotFound(UserId),

  /// The platform accepted the request but delivery failed (blocked
  /// DMs, missing permissions, transient outage).
  #[error("delivery failed: {0}")]
  Delivery(String),
}

// ─── Outbound content ────────────────────────────────────────────────────────

/// Styling hint attached to notices and buttons. The adapter maps these
/// to platform colours/styles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
  Neutral,
  Success,
  Warning,
  Danger,
}

/// A titled block of text with optional labelled fields.
#[derive(Debug, Clone)]
pub struct Notice {
  pub title:  String,
  pub body:   String,
  pub tone:   Tone,
  pub fields: Vec<(String, String)>,
}

impl Notice {
  pub fn new(title: impl Into<String>, body: impl Into<String>, tone: Tone) -> Self {
    Self {
      title: title.into(),
      body: body.into(),
      tone,
      fields: Vec::new(),
    }
  }

  pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
    self.fields.push((name.into(), value.into()));
    self
  }
}

/// An interactive button. `id` is the component-id wire string produced
/// by [`crate::event::CustomId`].
#[derive(Debug, Clone)]
pub struct Button {
  pub id:    String,
  pub label: String,
  pub tone:  Tone,
}

/// A single-select menu and its options.
#[derive(Debug, Clone)]
pub struct Menu {
  pub id:          String,
  pub placeholder: String,
  pub options:     Vec<MenuOption>,
}

#[derive(Debug, Clone)]
pub struct MenuOption {
  pub value:       String,
  pub label:       String,
  pub description: String,
}

/// A file delivered alongside a message.
#[derive(Debug, Clone)]
pub struct Attachment {
  pub filename: String,
  pub content:  Vec<u8>,
}

/// Everything a reply or channel message can carry.
#[derive(Debug, Clone, Default)]
pub struct OutboundMessage {
  pub text:       String,
  pub notice:     Option<Notice>,
  pub buttons:    Vec<Button>,
  pub menu:       Option<Menu>,
  pub attachment: Option<Attachment>,
}

impl OutboundMessage {
  pub fn text(text: impl Into<String>) -> Self {
    Self { text: text.into(), ..Self::default() }
  }

  pub fn notice(notice: Notice) -> Self {
    Self { notice: Some(notice), ..Self::default() }
  }

  pub fn with_buttons(mut self, buttons: Vec<Button>) -> Self {
    self.buttons = buttons;
    self
  }

  pub fn with_menu(mut self, menu: Menu) -> Self {
    self.menu = Some(menu);
    self
  }

  pub fn with_attachment(mut self, attachment: Attachment) -> Self {
    self.attachment = Some(attachment);
    self
  }
}

// ─── Inbound content ─────────────────────────────────────────────────────────

/// One message from a ticket channel's history, as delivered by the
/// gateway when asked for a bounded window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelMessage {
  /// Display tag of the author (not an id; transcripts are for humans).
  pub author:      String,
  pub content:     String,
  pub created_at:  DateTime<Utc>,
  pub attachments: Vec<String>,
}

/// Request to create a ticket channel visible only to its owner (and
/// staff, per the adapter's permission scheme).
#[derive(Debug, Clone)]
pub struct ChannelRequest {
  pub name:     String,
  pub owner:    UserId,
  /// Category the channel is created under, when configured.
  pub category: Option<ChannelId>,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Outbound half of the chat-platform adapter.
///
/// Implementations must allow exactly one initial `reply` per
/// interaction; subsequent updates go through `edit_reply`. The
/// `Responder` wrapper in the service crate enforces that ordering for
/// handler code.
pub trait Gateway: Send + Sync {
  /// Send the initial (ephemeral) reply to an interaction.
  fn reply<'a>(
    &'a self,
    interaction: &'a InteractionId,
    message: &'a OutboundMessage,
  ) -> impl Future<Output = Result<(), GatewayError>> + Send + 'a;

  /// Edit a reply previously sent with [`Gateway::reply`].
  fn edit_reply<'a>(
    &'a self,
    interaction: &'a InteractionId,
    message: &'a OutboundMessage,
  ) -> impl Future<Output = Result<(), GatewayError>> + Send + 'a;

  /// Create a channel restricted to `request.owner`.
  fn create_ticket_channel<'a>(
    &'a self,
    request: &'a ChannelRequest,
  ) -> impl Future<Output = Result<ChannelId, GatewayError>> + Send + 'a;

  /// Post a message to a channel.
  fn send_message<'a>(
    &'a self,
    channel: &'a ChannelId,
    message: &'a OutboundMessage,
  ) -> impl Future<Output = Result<(), GatewayError>> + Send + 'a;

  /// Fetch up to `limit` most recent messages from a channel.
  fn fetch_history<'a>(
    &'a self,
    channel: &'a ChannelId,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<ChannelMessage>, GatewayError>> + Send + 'a;

  /// Delete a channel. Irreversible.
  fn delete_channel<'a>(
    &'a self,
    channel: &'a ChannelId,
  ) -> impl Future<Output = Result<(), GatewayError>> + Send + 'a;

  /// Send a private message to a user.
  fn send_direct<'a>(
    &'a self,
    user: &'a UserId,
    message: &'a OutboundMessage,
  ) -> impl Future<Output = Result<(), GatewayError>> + Send + 'a;
}
