//! Error type for `vantage-store-sqlite`.

use thiserror::Error;
use vantage_core::store::{Conflict, StoreError};

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] vantage_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A UNIQUE constraint rejected the write; the transaction was rolled back.
  #[error("unique constraint violated: {0:?}")]
  Conflict(Conflict),

  #[error("user not found: {0}")]
  UserNotFound(uuid::Uuid),
}

impl StoreError for Error {
  fn conflict(&self) -> Option<Conflict> {
    match self {
      Error::Conflict(c) => Some(*c),
      _ => None,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
