//! Error type for `triage-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] triage_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("malformed row: {0}")]
  Decode(String),
}

impl From<Error> for triage_core::Error {
  fn from(err: Error) -> Self {
    match err {
      Error::Core(core) => core,
      Error::Database(db) => triage_core::Error::Storage(db.to_string()),
      Error::DateParse(msg) | Error::Decode(msg) => {
        triage_core::Error::Storage(msg)
      }
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
