//! The lifecycle controller.
//!
//! [`TicketService::handle`] is the single entry point for inbound
//! interactions. Dispatch happens on the typed payload; every branch
//! funnels its outcome through one recovery boundary that turns the
//! error taxonomy into a user-facing reply plus an audit event, so
//! individual flows only ever propagate with `?`.

use std::{sync::Arc, time::Duration};

use chrono::Utc;
use triage_core::{
  Error,
  event::{CustomId, EventPayload, InteractionEvent},
  gateway::{
    Attachment, Button, ChannelRequest, Gateway, GatewayError, Menu,
    MenuOption, Notice, OutboundMessage, Tone,
  },
  id::{ChannelId, InteractionId, TicketId},
  store::TicketStore,
  ticket::{MAX_ACTIVE_TICKETS, NewTicket, Ticket, TicketStatus, TicketType},
  transcript,
};

use crate::{
  audit::{AuditEvent, AuditLogger},
  config::ServiceConfig,
};

// ─── Responder ───────────────────────────────────────────────────────────────

/// Tracks whether an interaction has been answered yet. The first
/// `send` issues the initial reply; later ones edit it.
struct Responder<'g, G> {
  gateway:     &'g G,
  interaction: InteractionId,
  replied:     bool,
}

impl<'g, G: Gateway> Responder<'g, G> {
  fn new(gateway: &'g G, interaction: InteractionId) -> Self {
    Self { gateway, interaction, replied: false }
  }

  async fn send(&mut self, message: &OutboundMessage) -> Result<(), GatewayError> {
    if self.replied {
      self.gateway.edit_reply(&self.interaction, message).await
    } else {
      self.replied = true;
      self.gateway.reply(&self.interaction, message).await
    }
  }
}

// ─── Service ─────────────────────────────────────────────────────────────────

/// Drives the ticket state machine in response to interaction events.
pub struct TicketService<S, G> {
  store:         S,
  gateway:       Arc<G>,
  audit:         AuditLogger<S, G>,
  category:      Option<ChannelId>,
  cleanup_grace: Duration,
}

impl<S, G> TicketService<S, G>
where
  S: TicketStore + Clone + Send + Sync + 'static,
  G: Gateway + 'static,
{
  pub fn new(store: S, gateway: Arc<G>, config: &ServiceConfig) -> Self {
    let audit = AuditLogger::new(
      store.clone(),
      Arc::clone(&gateway),
      config.log_channel.clone(),
    );
    Self {
      store,
      gateway,
      audit,
      category: config.ticket_category.clone(),
      cleanup_grace: Duration::from_secs(config.cleanup_grace_secs),
    }
  }

  /// Record that the service came up. Call once after construction.
  pub async fn announce_startup(&self) {
    self
      .audit
      .record(AuditEvent::system("startup", "Ticket service started"))
      .await;
  }

  /// Handle one inbound interaction. Infallible from the caller's view:
  /// failures are answered to the user and audited here.
  pub async fn handle(&self, event: InteractionEvent) {
    let mut responder = Responder::new(self.gateway.as_ref(), event.interaction);

    if let EventPayload::Button(id) = &event.payload {
      self
        .audit
        .record(AuditEvent::interaction(
          "button",
          &event.actor,
          format!("Button pressed: {id}"),
          Some(event.channel.clone()),
        ))
        .await;
    }

    if let Err(err) = self.dispatch(&event, &mut responder).await {
      tracing::error!(
        actor = %event.actor,
        channel = %event.channel,
        error = %err,
        "interaction failed"
      );
      self.audit.record(rejection_event(&event, &err)).await;

      let message = OutboundMessage::text(user_message(&err));
      if let Err(e) = responder.send(&message).await {
        tracing::error!(error = %e, "failed to deliver error reply");
      }
    }
  }

  async fn dispatch(
    &self,
    event: &InteractionEvent,
    responder: &mut Responder<'_, G>,
  ) -> Result<(), Error> {
    match &event.payload {
      EventPayload::Command { name } if name == "ticket" => {
        self.post_ticket_panel(event, responder).await
      }
      EventPayload::Button(CustomId::CreateTicket) => {
        self.offer_type_menu(responder).await
      }
      EventPayload::Select { menu: CustomId::TypeSelect, value } => {
        self.open_ticket(event, responder, value).await
      }
      EventPayload::Button(CustomId::CloseTicket(id)) => {
        self.request_close(event, responder, id).await
      }
      EventPayload::Button(CustomId::ConfirmClose(id)) => {
        self.confirm_close(event, responder, id).await
      }
      EventPayload::Button(CustomId::CancelClose) => {
        self.cancel_close(responder).await
      }
      EventPayload::Button(CustomId::ClaimTicket(id)) => {
        self.claim(event, responder, id).await
      }
      EventPayload::Button(CustomId::Transcript(id)) => {
        self.send_transcript(event, responder, id).await
      }
      // Unrecognised commands and menus are not ours to answer.
      _ => Ok(()),
    }
  }

  // ── Panel and type selection ──────────────────────────────────────────

  async fn post_ticket_panel(
    &self,
    event: &InteractionEvent,
    responder: &mut Responder<'_, G>,
  ) -> Result<(), Error> {
    let panel = OutboundMessage::notice(Notice::new(
      "Support Tickets",
      "Click the button below to create a support ticket.",
      Tone::Neutral,
    ))
    .with_buttons(vec![Button {
      id:    CustomId::CreateTicket.render(),
      label: "Create Ticket".to_owned(),
      tone:  Tone::Success,
    }]);

    self.gateway.send_message(&event.channel, &panel).await?;

    self
      .audit
      .record(AuditEvent::command(
        "ticket",
        &event.actor,
        "Ticket panel created",
      ))
      .await;

    responder
      .send(&OutboundMessage::text("Ticket menu has been created!"))
      .await?;
    Ok(())
  }

  async fn offer_type_menu(
    &self,
    responder: &mut Responder<'_, G>,
  ) -> Result<(), Error> {
    let options = TicketType::ALL
      .iter()
      .map(|ty| MenuOption {
        value:       ty.as_str().to_owned(),
        label:       ty.label().to_owned(),
        description: ty.description().to_owned(),
      })
      .collect();

    let message = OutboundMessage::text("Select the type of ticket to create:")
      .with_menu(Menu {
        id:          CustomId::TypeSelect.render(),
        placeholder: "Select ticket type".to_owned(),
        options,
      });

    responder.send(&message).await?;
    Ok(())
  }

  // ── Creation ──────────────────────────────────────────────────────────

  async fn open_ticket(
    &self,
    event: &InteractionEvent,
    responder: &mut Responder<'_, G>,
    raw_type: &str,
  ) -> Result<(), Error> {
    let ticket_type = TicketType::parse(raw_type)?;

    let active = self
      .store
      .active_tickets_for_user(&event.actor)
      .await
      .map_err(Into::into)?;
    if active.len() >= MAX_ACTIVE_TICKETS {
      return Err(Error::QuotaExceeded { limit: MAX_ACTIVE_TICKETS });
    }

    let ticket_id = TicketId::generate(Utc::now());
    let channel_id = self
      .gateway
      .create_ticket_channel(&ChannelRequest {
        name:     format!("ticket-{}", ticket_id.as_str().to_lowercase()),
        owner:    event.actor.clone(),
        category: self.category.clone(),
      })
      .await?;

    let created = self
      .store
      .create_ticket(NewTicket {
        ticket_id,
        user_id: event.actor.clone(),
        channel_id: channel_id.clone(),
        ticket_type,
      })
      .await;
    let ticket = match created {
      Ok(ticket) => ticket,
      // The channel was minted for a ticket that never came to exist;
      // remove it rather than leaving an orphan behind.
      Err(e) => {
        if let Err(del) = self.gateway.delete_channel(&channel_id).await {
          tracing::warn!(%channel_id, error = %del, "failed to remove channel after create failure");
        }
        return Err(e.into());
      }
    };

    let welcome = OutboundMessage::notice(
      Notice::new(
        format!("Ticket #{}", ticket.ticket_number),
        "Support will be with you shortly. Use the buttons below to \
         manage this ticket.",
        ticket_type.tone(),
      )
      .field("Type", ticket_type.label())
      .field("Created by", ticket.user_id.to_string()),
    )
    .with_buttons(vec![
      Button {
        id:    CustomId::CloseTicket(ticket.ticket_id.clone()).render(),
        label: "Close Ticket".to_owned(),
        tone:  Tone::Danger,
      },
      Button {
        id:    CustomId::ClaimTicket(ticket.ticket_id.clone()).render(),
        label: "Claim Ticket".to_owned(),
        tone:  Tone::Warning,
      },
      Button {
        id:    CustomId::Transcript(ticket.ticket_id.clone()).render(),
        label: "Transcript".to_owned(),
        tone:  Tone::Neutral,
      },
    ]);
    // The ticket exists either way; a failed welcome post is not fatal.
    if let Err(e) = self.gateway.send_message(&channel_id, &welcome).await {
      tracing::warn!(ticket = %ticket.ticket_id, error = %e, "failed to post welcome message");
    }

    self
      .audit
      .record(AuditEvent::ticket(
        "create",
        &event.actor,
        &ticket,
        format!(
          "Ticket #{} ({}) created",
          ticket.ticket_number,
          ticket_type.label()
        ),
      ))
      .await;

    responder
      .send(&OutboundMessage::text(format!(
        "Your ticket has been created: {channel_id}"
      )))
      .await?;
    Ok(())
  }

  // ── Closing ───────────────────────────────────────────────────────────

  async fn request_close(
    &self,
    event: &InteractionEvent,
    responder: &mut Responder<'_, G>,
    ticket_id: &TicketId,
  ) -> Result<(), Error> {
    let ticket = self.get_existing(ticket_id).await?;
    if ticket.status == TicketStatus::Closed {
      responder
        .send(&OutboundMessage::text("This ticket is already closed."))
        .await?;
      return Ok(());
    }

    self
      .audit
      .record(AuditEvent::ticket(
        "close_attempt",
        &event.actor,
        &ticket,
        format!("Close requested for ticket {ticket_id}"),
      ))
      .await;

    let confirm = OutboundMessage::text(
      "Are you sure you want to close this ticket?",
    )
    .with_buttons(vec![
      Button {
        id:    CustomId::ConfirmClose(ticket_id.clone()).render(),
        label: "Confirm".to_owned(),
        tone:  Tone::Danger,
      },
      Button {
        id:    CustomId::CancelClose.render(),
        label: "Cancel".to_owned(),
        tone:  Tone::Neutral,
      },
    ]);
    responder.send(&confirm).await?;
    Ok(())
  }

  async fn confirm_close(
    &self,
    event: &InteractionEvent,
    responder: &mut Responder<'_, G>,
    ticket_id: &TicketId,
  ) -> Result<(), Error> {
    self.get_existing(ticket_id).await?;

    // Close first. Whoever wins this update owns the transcript and
    // cleanup; the losing press sees 0 rows and stops here.
    let rows = self
      .store
      .close_ticket(ticket_id)
      .await
      .map_err(Into::into)?;
    if rows == 0 {
      responder
        .send(&OutboundMessage::text("This ticket is already closed."))
        .await?;
      return Ok(());
    }

    // Re-read for the durable closed_at the update just assigned.
    let ticket = self.get_existing(ticket_id).await?;

    self
      .audit
      .record(AuditEvent::ticket(
        "close",
        &event.actor,
        &ticket,
        format!("Ticket {ticket_id} closed"),
      ))
      .await;

    match self.fetch_transcript(&ticket).await {
      Some(text) => {
        let farewell = OutboundMessage::notice(Notice::new(
          "Ticket Closed",
          "This ticket has been closed. A transcript has been sent to \
           the ticket creator.",
          Tone::Danger,
        ));
        if let Err(e) = self.gateway.send_message(&ticket.channel_id, &farewell).await {
          tracing::warn!(ticket = %ticket_id, error = %e, "failed to post closure notice");
        }

        self.deliver_transcript(&ticket, text).await;
        self.schedule_cleanup(ticket.channel_id.clone());
      }
      // Channel already gone: nothing to transcribe or delete.
      None => {
        tracing::warn!(ticket = %ticket_id, "ticket channel missing at close");
      }
    }

    responder
      .send(&OutboundMessage::text("Ticket closed successfully!"))
      .await?;
    Ok(())
  }

  async fn cancel_close(
    &self,
    responder: &mut Responder<'_, G>,
  ) -> Result<(), Error> {
    responder
      .send(&OutboundMessage::text("Ticket close cancelled."))
      .await?;
    Ok(())
  }

  /// Fetch and render the transcript for a ticket. Returns `None` when
  /// the channel no longer exists; any other fetch failure yields the
  /// placeholder body so closing is never blocked.
  async fn fetch_transcript(&self, ticket: &Ticket) -> Option<String> {
    match self
      .gateway
      .fetch_history(&ticket.channel_id, transcript::HISTORY_LIMIT)
      .await
    {
      Ok(messages) => Some(transcript::render(ticket, &messages, Utc::now())),
      Err(GatewayError::ChannelNotFound(_)) => None,
      Err(e) => {
        tracing::warn!(ticket = %ticket.ticket_id, error = %e, "history fetch failed");
        Some(transcript::FETCH_FAILED_PLACEHOLDER.to_owned())
      }
    }
  }

  async fn deliver_transcript(&self, ticket: &Ticket, text: String) {
    let message = OutboundMessage::text("Here is the transcript of your ticket:")
      .with_attachment(Attachment {
        filename: transcript::file_name(&ticket.ticket_id),
        content:  text.into_bytes(),
      });

    match self.gateway.send_direct(&ticket.user_id, &message).await {
      Ok(()) => {
        self
          .audit
          .record(AuditEvent::ticket(
            "transcript",
            &ticket.user_id,
            ticket,
            format!("Transcript for ticket {} delivered", ticket.ticket_id),
          ))
          .await;
      }
      Err(e) => {
        tracing::warn!(ticket = %ticket.ticket_id, error = %e, "transcript delivery failed");
        self
          .audit
          .record(
            AuditEvent::error(
              Some(ticket.user_id.clone()),
              format!(
                "Failed to deliver transcript for ticket {}: {e}",
                ticket.ticket_id
              ),
            )
            .with_ticket(ticket.ticket_id.clone()),
          )
          .await;
      }
    }
  }

  /// Delete the ticket channel after the grace period, off the request
  /// path.
  fn schedule_cleanup(&self, channel: ChannelId) {
    let gateway = Arc::clone(&self.gateway);
    let grace = self.cleanup_grace;
    tokio::spawn(async move {
      tokio::time::sleep(grace).await;
      if let Err(e) = gateway.delete_channel(&channel).await {
        tracing::warn!(%channel, error = %e, "failed to delete ticket channel");
      }
    });
  }

  // ── Claiming ──────────────────────────────────────────────────────────

  async fn claim(
    &self,
    event: &InteractionEvent,
    responder: &mut Responder<'_, G>,
    ticket_id: &TicketId,
  ) -> Result<(), Error> {
    self.get_existing(ticket_id).await?;

    let rows = self
      .store
      .update_status(ticket_id, TicketStatus::Claimed, Some(&event.actor))
      .await
      .map_err(Into::into)?;
    if rows == 0 {
      // Lost the race, or the ticket was never claimable. The re-read
      // distinguishes a standing claimant from a closed ticket.
      let ticket = self.get_existing(ticket_id).await?;
      return match ticket.claimed_by {
        Some(claimed_by) => Err(Error::AlreadyClaimed {
          ticket_id: ticket_id.clone(),
          claimed_by,
        }),
        None => {
          responder
            .send(&OutboundMessage::text("This ticket is already closed."))
            .await?;
          Ok(())
        }
      };
    }

    let ticket = self.get_existing(ticket_id).await?;

    self
      .audit
      .record(AuditEvent::ticket(
        "claim",
        &event.actor,
        &ticket,
        format!("Ticket {ticket_id} claimed by {}", event.actor),
      ))
      .await;

    let notice = OutboundMessage::notice(Notice::new(
      "Ticket Claimed",
      format!("This ticket will be handled by {}.", event.actor),
      Tone::Warning,
    ));
    if let Err(e) = self.gateway.send_message(&ticket.channel_id, &notice).await {
      tracing::warn!(ticket = %ticket_id, error = %e, "failed to post claim notice");
    }

    responder
      .send(&OutboundMessage::text("Ticket claimed successfully!"))
      .await?;
    Ok(())
  }

  // ── Transcripts on demand ─────────────────────────────────────────────

  async fn send_transcript(
    &self,
    event: &InteractionEvent,
    responder: &mut Responder<'_, G>,
    ticket_id: &TicketId,
  ) -> Result<(), Error> {
    let ticket = self.get_existing(ticket_id).await?;

    let text = self
      .fetch_transcript(&ticket)
      .await
      .ok_or_else(|| Error::ChannelNotFound(ticket.channel_id.clone()))?;

    let message = OutboundMessage::text("Here is the transcript of your ticket:")
      .with_attachment(Attachment {
        filename: transcript::file_name(ticket_id),
        content:  text.into_bytes(),
      });
    responder.send(&message).await?;

    self
      .audit
      .record(AuditEvent::ticket(
        "transcript_download",
        &event.actor,
        &ticket,
        format!("Transcript for ticket {ticket_id} downloaded"),
      ))
      .await;
    Ok(())
  }

  // ── Helpers ───────────────────────────────────────────────────────────

  async fn get_existing(&self, ticket_id: &TicketId) -> Result<Ticket, Error> {
    self
      .store
      .get_ticket(ticket_id)
      .await
      .map_err(Into::into)?
      .ok_or_else(|| Error::TicketNotFound(ticket_id.clone()))
  }
}

// ─── Error presentation ──────────────────────────────────────────────────────

/// User-facing reply for a failed interaction. Expected rejections get
/// specific wording; everything else gets a generic apology while the
/// detail goes to the audit trail.
fn user_message(err: &Error) -> String {
  match err {
    Error::TicketNotFound(_) => "Ticket not found!".to_owned(),
    Error::ChannelNotFound(_) => "Ticket channel not found!".to_owned(),
    Error::AlreadyClaimed { claimed_by, .. } => {
      format!("This ticket is already claimed by {claimed_by}.")
    }
    Error::QuotaExceeded { limit } => format!(
      "You have reached the maximum number of open tickets ({limit}). \
       Please close an existing ticket before creating a new one."
    ),
    _ => "There was an error while processing your request. Please try \
          again later."
      .to_owned(),
  }
}

fn rejection_event(event: &InteractionEvent, err: &Error) -> AuditEvent {
  match err {
    Error::QuotaExceeded { limit } => AuditEvent::interaction(
      "ticket_limit",
      &event.actor,
      format!("Ticket creation blocked: {limit} active tickets"),
      Some(event.channel.clone()),
    ),
    Error::AlreadyClaimed { ticket_id, claimed_by } => AuditEvent::interaction(
      "claim_attempt",
      &event.actor,
      format!("Claim rejected: already claimed by {claimed_by}"),
      Some(event.channel.clone()),
    )
    .with_ticket(ticket_id.clone()),
    _ => AuditEvent::error(Some(event.actor.clone()), err.to_string()),
  }
}
