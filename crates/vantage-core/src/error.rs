//! Error types for `vantage-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("user record carries neither a password hash nor a federated id")]
  MissingCredential,

  #[error("unknown change direction: {0:?}")]
  UnknownDirection(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
