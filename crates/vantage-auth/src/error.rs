//! Error type for `vantage-auth`.

use thiserror::Error;
use vantage_core::store::StoreError;

#[derive(Debug, Error)]
pub enum AuthError {
  /// No usable `Authorization: Bearer <token>` header.
  #[error("authentication token is missing")]
  MissingToken,

  #[error("session token has expired")]
  TokenExpired,

  /// Bad signature, wrong algorithm or malformed claims.
  #[error("session token is invalid")]
  TokenInvalid,

  /// The token verified but its user no longer exists.
  #[error("user not found for session token")]
  UserNotFound,

  /// Unknown email, federated-only account, or wrong password. Deliberately
  /// indistinguishable.
  #[error("invalid credentials")]
  InvalidCredentials,

  #[error("email already registered")]
  EmailTaken,

  #[error("invalid federated identity assertion: {0}")]
  InvalidAssertion(String),

  /// The identity provider could not be reached or served unusable keys.
  #[error("identity provider unavailable: {0}")]
  Provider(String),

  #[error("password hashing failed: {0}")]
  Hashing(String),

  #[error("token signing failed: {0}")]
  Signing(String),

  #[error("secret key must be at least {0} bytes")]
  WeakSecret(usize),

  #[error("federated login for subject {0:?} kept conflicting with concurrent writes")]
  ReconcileContention(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl AuthError {
  pub fn store<E: StoreError>(e: E) -> Self { Self::Store(Box::new(e)) }
}

pub type Result<T, E = AuthError> = std::result::Result<T, E>;
