//! Plain-text transcript rendering.
//!
//! Rendering is a pure function of the ticket, the message list, and a
//! generation timestamp, so identical inputs always produce identical
//! bytes. Fetching the history (and falling back to a placeholder when
//! the fetch fails) is the caller's job.

use chrono::{DateTime, Utc};

use crate::{gateway::ChannelMessage, id::TicketId, ticket::Ticket};

/// Bounded window of channel history included in a transcript.
pub const HISTORY_LIMIT: usize = 100;

/// Returned in place of a transcript when history could not be fetched,
/// so the close flow is never blocked by transcript failure.
pub const FETCH_FAILED_PLACEHOLDER: &str = "Error generating transcript.";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

/// Filename for a transcript delivered as a file attachment.
pub fn file_name(ticket_id: &TicketId) -> String {
  format!("transcript-{ticket_id}.txt")
}

/// Render a transcript: header, then one line per message in ascending
/// creation order.
///
/// `generated_at` is printed as the closing timestamp for tickets that
/// are not yet closed (on-demand transcripts of open tickets).
pub fn render(
  ticket: &Ticket,
  messages: &[ChannelMessage],
  generated_at: DateTime<Utc>,
) -> String {
  let mut ordered: Vec<&ChannelMessage> = messages.iter().collect();
  ordered.sort_by_key(|m| m.created_at);

  let closed_at = ticket.closed_at.unwrap_or(generated_at);

  let mut out = String::new();
  out.push_str(&format!("# Transcript for Ticket {}\n", ticket.ticket_id));
  out.push_str(&format!("Type: {}\n", ticket.ticket_type.label()));
  out.push_str(&format!("Created by: {}\n", ticket.user_id));
  out.push_str(&format!(
    "Created at: {}\n",
    ticket.created_at.format(TIMESTAMP_FORMAT)
  ));
  out.push_str(&format!(
    "Closed at: {}\n\n",
    closed_at.format(TIMESTAMP_FORMAT)
  ));
  out.push_str("## Messages:\n\n");

  for message in ordered {
    let content = if message.content.is_empty() {
      "[No text content]"
    } else {
      message.content.as_str()
    };
    out.push_str(&format!(
      "[{}] {}: {}\n",
      message.created_at.format(TIMESTAMP_FORMAT),
      message.author,
      content
    ));
    if !message.attachments.is_empty() {
      out.push_str(&format!(
        "Attachments: {}\n",
        message.attachments.join(", ")
      ));
    }
    out.push('\n');
  }

  out
}
