//! API error taxonomy and its [`IntoResponse`] rendering.

use std::collections::BTreeMap;

use axum::{
  http::StatusCode,
  response::{IntoResponse, Response},
};
use thiserror::Error;
use vantage_auth::AuthError;

use crate::envelope::Envelope;

/// Client-facing message for anything that ends up as a 500.
pub const INTERNAL_MESSAGE: &str = "An unexpected error occurred. Please try again later.";

/// Per-field validation messages, keyed by field name.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// An error returned by an API handler or the session gate.
#[derive(Debug, Error)]
pub enum ApiError {
  /// The body parsed but one or more fields failed validation.
  #[error("validation failed for {} field(s)", .0.len())]
  Validation(FieldErrors),

  /// The body could not be interpreted at all.
  #[error("bad request: {0}")]
  BadRequest(&'static str),

  #[error(transparent)]
  Auth(#[from] AuthError),

  #[error("not found: {0}")]
  NotFound(&'static str),

  #[error("method not allowed")]
  MethodNotAllowed,

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("internal error: {0}")]
  Internal(String),
}

impl ApiError {
  pub fn store<E: std::error::Error + Send + Sync + 'static>(e: E) -> Self {
    Self::Store(Box::new(e))
  }

  /// Status code and client-facing message. Internal detail never leaks.
  fn status_and_message(&self) -> (StatusCode, &'static str) {
    match self {
      ApiError::Validation(_) => (StatusCode::BAD_REQUEST, "Validation failed."),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, *m),
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, *m),
      ApiError::MethodNotAllowed => (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed."),
      ApiError::Auth(e) => match e {
        AuthError::MissingToken => (StatusCode::UNAUTHORIZED, "Authentication Token is missing!"),
        AuthError::TokenExpired => (StatusCode::UNAUTHORIZED, "Token has expired!"),
        AuthError::TokenInvalid => (StatusCode::UNAUTHORIZED, "Token is invalid!"),
        AuthError::UserNotFound => (StatusCode::UNAUTHORIZED, "Invalid Token: User not found!"),
        AuthError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "Invalid credentials"),
        AuthError::InvalidAssertion(_) => (StatusCode::UNAUTHORIZED, "Invalid Google ID token."),
        AuthError::EmailTaken => (StatusCode::CONFLICT, "Email already registered"),
        AuthError::Provider(_)
        | AuthError::Hashing(_)
        | AuthError::Signing(_)
        | AuthError::WeakSecret(_)
        | AuthError::ReconcileContention(_)
        | AuthError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE),
      },
      ApiError::Store(_) | ApiError::Internal(_) => {
        (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE)
      }
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = self.status_and_message();

    if status.is_server_error() {
      tracing::error!(error = %self, source = ?std::error::Error::source(&self), "request failed");
    } else if let ApiError::Auth(AuthError::InvalidAssertion(reason)) = &self {
      tracing::warn!(%reason, "rejected federated assertion");
    }

    match self {
      ApiError::Validation(fields) => (status, Envelope::failure(Some(fields), message)).into_response(),
      _ => (status, Envelope::<()>::failure(None, message)).into_response(),
    }
  }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
