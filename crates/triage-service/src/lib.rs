//! Lifecycle controller and audit pipeline for the triage ticket
//! service.
//!
//! [`TicketService`] consumes typed interaction events from a gateway
//! adapter and drives the ticket state machine against a
//! [`triage_core::store::TicketStore`] backend. The platform connection
//! itself lives outside this crate; deployments construct the service
//! with their adapter's [`triage_core::gateway::Gateway`]
//! implementation.

pub mod audit;
pub mod config;
pub mod handler;

pub use audit::{AuditEvent, AuditKind, AuditLogger};
pub use config::ServiceConfig;
pub use handler::TicketService;
