//! `triage-admin` — operator inspection tool for the ticket store.
//!
//! # Usage
//!
//! ```
//! triage-admin open
//! triage-admin open --json
//! triage-admin show TICKET-1714500000000
//! triage-admin logs TICKET-1714500000000
//! ```
//!
//! Reads the same config file as the service (database path), so it can
//! be pointed at a live deployment's database.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use triage_core::{id::TicketId, store::TicketStore as _, ticket::Ticket};
use triage_service::ServiceConfig;
use triage_store_sqlite::SqliteStore;

// ─── CLI args ────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "triage-admin", about = "Inspect the triage ticket store")]
struct Args {
  /// Path to the service's TOML config file.
  #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
  config: std::path::PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// List all open tickets, newest first.
  Open {
    /// Emit JSON instead of the human-readable table.
    #[arg(long)]
    json: bool,
  },
  /// Show a single ticket.
  Show { ticket_id: String },
  /// Print the audit trail for a ticket, newest first.
  Logs { ticket_id: String },
}

// ─── Entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
    )
    .init();

  let args = Args::parse();
  let config = ServiceConfig::load(&args.config)
    .with_context(|| format!("loading config from {}", args.config.display()))?;
  let store = SqliteStore::open(&config.database_path)
    .await
    .with_context(|| {
      format!("opening database {}", config.database_path.display())
    })?;

  match args.command {
    Command::Open { json } => {
      let tickets = store.list_open_tickets().await?;
      if json {
        println!("{}", serde_json::to_string_pretty(&tickets)?);
      } else if tickets.is_empty() {
        println!("no open tickets");
      } else {
        for ticket in &tickets {
          print_ticket_line(ticket);
        }
      }
    }
    Command::Show { ticket_id } => {
      let id = TicketId::from(ticket_id);
      let ticket = store
        .get_ticket(&id)
        .await?
        .with_context(|| format!("ticket {id} not found"))?;
      println!("{}", serde_json::to_string_pretty(&ticket)?);
    }
    Command::Logs { ticket_id } => {
      let logs = store.list_audit_logs(&ticket_id).await?;
      if logs.is_empty() {
        println!("no audit entries for {ticket_id}");
      } else {
        for entry in &logs {
          println!(
            "{}  {:<28} {:<16} {}",
            entry.created_at.format("%Y-%m-%d %H:%M:%S"),
            entry.action,
            entry.user_id,
            entry.details.replace('\n', " | ")
          );
        }
      }
    }
  }

  Ok(())
}

fn print_ticket_line(ticket: &Ticket) {
  let claimed = ticket
    .claimed_by
    .as_ref()
    .map(|u| u.as_str())
    .unwrap_or("-");
  println!(
    "#{:<5} {:<24} {:<10} {:<10} owner={} claimed={}",
    ticket.ticket_number,
    ticket.ticket_id.as_str(),
    ticket.ticket_type.as_str(),
    ticket.status.as_str(),
    ticket.user_id,
    claimed
  );
}
