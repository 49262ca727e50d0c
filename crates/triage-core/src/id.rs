//! Opaque identifier newtypes.
//!
//! User and channel ids are references into the external chat platform
//! and are never interpreted; ticket ids are generated here. Keeping
//! them as distinct types stops a channel id from ending up in a user
//! column and vice versa.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! string_id {
  ($(#[$doc:meta])* $name:ident) => {
    $(#[$doc])*
    #[derive(
      Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
    )]
    #[serde(transparent)]
    pub struct $name(String);

    impl $name {
      pub fn new(raw: impl Into<String>) -> Self { Self(raw.into()) }

      pub fn as_str(&self) -> &str { &self.0 }
    }

    impl fmt::Display for $name {
      fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
      }
    }

    impl From<&str> for $name {
      fn from(raw: &str) -> Self { Self(raw.to_owned()) }
    }

    impl From<String> for $name {
      fn from(raw: String) -> Self { Self(raw) }
    }
  };
}

string_id! {
  /// Globally unique ticket token, e.g. `TICKET-1714500000000`.
  TicketId
}

string_id! {
  /// Opaque external identity reference (platform user id).
  UserId
}

string_id! {
  /// Opaque external resource reference (platform channel id).
  ChannelId
}

impl TicketId {
  /// Generate a fresh ticket id from a high-resolution timestamp.
  ///
  /// Uniqueness is still checked against the store on insertion; a
  /// same-millisecond collision surfaces as `DuplicateTicketId`.
  pub fn generate(now: DateTime<Utc>) -> Self {
    Self(format!("TICKET-{}", now.timestamp_millis()))
  }
}

/// Identity of a single inbound interaction. Replies are addressed to
/// this, and the gateway permits one initial reply per interaction.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct InteractionId(pub Uuid);

impl InteractionId {
  pub fn new() -> Self { Self(Uuid::new_v4()) }
}

impl Default for InteractionId {
  fn default() -> Self { Self::new() }
}

impl fmt::Display for InteractionId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}
