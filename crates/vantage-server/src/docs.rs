//! OpenAPI document for the HTTP API, served under `/api/docs`.

use axum::Router;
use utoipa::{
  Modify, OpenApi,
  openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};

use crate::handlers::{auth, dashboard, health};

/// Path of the generated JSON document.
pub const OPENAPI_PATH: &str = "/api/docs/openapi.json";

#[derive(OpenApi)]
#[openapi(
  info(
    title = "Vantage API",
    description = "Authentication and analytics endpoints for the Vantage dashboard. \
                   Every response is wrapped in `{success, data, message}`."
  ),
  paths(
    auth::signup,
    auth::login,
    auth::google_login,
    auth::verify_token,
    dashboard::summary,
    dashboard::total_users,
    dashboard::traffic_by_device,
    dashboard::traffic_by_location,
    health::check,
  ),
  modifiers(&BearerAuth),
  tags(
    (name = "Auth", description = "Signup, login and session tokens"),
    (name = "Dashboard", description = "Summary cards and chart series; bearer token required"),
    (name = "System", description = "Liveness"),
  )
)]
pub struct ApiDoc;

/// Registers the `Authorization: Bearer <token>` scheme the protected
/// paths refer to.
struct BearerAuth;

impl Modify for BearerAuth {
  fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
    let components = openapi.components.get_or_insert_with(Default::default);
    components.add_security_scheme(
      "bearer_auth",
      SecurityScheme::Http(
        HttpBuilder::new()
          .scheme(HttpAuthScheme::Bearer)
          .bearer_format("JWT")
          .build(),
      ),
    );
  }
}

/// Swagger UI at `/api/docs`, backed by [`OPENAPI_PATH`].
#[cfg(feature = "swagger-ui")]
pub fn routes<St: Clone + Send + Sync + 'static>() -> Router<St> {
  utoipa_swagger_ui::SwaggerUi::new("/api/docs")
    .url(OPENAPI_PATH, ApiDoc::openapi())
    .into()
}

/// Only the JSON document; the UI bundle is not compiled in.
#[cfg(not(feature = "swagger-ui"))]
pub fn routes<St: Clone + Send + Sync + 'static>() -> Router<St> {
  use axum::{Json, routing::get};

  let doc = ApiDoc::openapi();
  Router::new().route(OPENAPI_PATH, get(move || {
    let doc = doc.clone();
    async move { Json(doc) }
  }))
}
