use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use crate::envelope::Envelope;

#[derive(Debug, Serialize, ToSchema)]
pub struct Health {
  pub status: &'static str,
}

/// `GET /api/health-check`
#[utoipa::path(
  get,
  path = "/api/health-check",
  tag = "System",
  summary = "Health check",
  responses((status = 200, description = "API is running", body = Envelope<Health>))
)]
pub async fn check() -> Json<Envelope<Health>> {
  Envelope::success(Health { status: "API is running!" }, "Health check successful.")
}
