//! Core types and trait definitions for the triage ticket service.
//!
//! This crate is deliberately free of database and chat-platform
//! dependencies. The storage backend implements [`store::TicketStore`];
//! the platform adapter implements [`gateway::Gateway`]. Everything else
//! depends on those seams, never on a concrete backend.

pub mod audit;
pub mod error;
pub mod event;
pub mod gateway;
pub mod id;
pub mod store;
pub mod ticket;
pub mod transcript;

pub use error::{Error, Result};
