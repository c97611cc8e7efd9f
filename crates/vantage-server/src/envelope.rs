//! The JSON envelope every response is wrapped in.

use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

/// `{ "success": …, "data": …, "message": … }`.
///
/// The HTTP status carries the outcome class; `success` mirrors it for
/// clients that only look at the body.
#[derive(Debug, Serialize, ToSchema)]
pub struct Envelope<T> {
  pub success: bool,
  pub data:    Option<T>,
  pub message: Option<String>,
}

impl<T: Serialize> Envelope<T> {
  pub fn success(data: T, message: impl Into<String>) -> Json<Self> {
    Json(Self { success: true, data: Some(data), message: Some(message.into()) })
  }

  pub fn failure(data: Option<T>, message: impl Into<String>) -> Json<Self> {
    Json(Self { success: false, data, message: Some(message.into()) })
  }
}
