//! HTTP layer for Vantage.
//!
//! Exposes an axum [`Router`] serving the auth and dashboard API over any
//! [`DashboardStore`]. Every response is wrapped in an [`Envelope`].

pub mod docs;
pub mod envelope;
pub mod error;
pub mod gate;
pub mod handlers;
pub mod validation;

pub use envelope::Envelope;
pub use error::{ApiError, ApiResult};

use std::{any::Any, path::PathBuf, sync::Arc};

use axum::{
  Router, middleware,
  response::{IntoResponse, Response},
  routing::{get, post},
};
use serde::Deserialize;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};
use vantage_auth::{Accounts, AssertionVerifier, IdentityReconciler, SessionIssuer};
use vantage_core::{analytics::Analytics, clock::Clock, store::DashboardStore};

use handlers::{auth, dashboard, health};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `VANTAGE_*` environment variables.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:             String,
  #[serde(default = "default_port")]
  pub port:             u16,
  #[serde(default = "default_store_path")]
  pub store_path:       PathBuf,
  /// HMAC secret for session tokens. At least 32 bytes.
  pub secret_key:       String,
  /// OAuth client id that Google ID tokens must be issued for. Federated
  /// login is refused while unset.
  #[serde(default)]
  pub google_client_id: Option<String>,
}

fn default_host() -> String { "127.0.0.1".into() }
fn default_port() -> u16 { 5000 }
fn default_store_path() -> PathBuf { PathBuf::from("~/.local/share/vantage/vantage.db") }

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S> {
  pub store:      Arc<S>,
  pub sessions:   Arc<SessionIssuer>,
  pub accounts:   Accounts<S>,
  pub reconciler: IdentityReconciler<S>,
  pub analytics:  Analytics<S>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:      Arc::clone(&self.store),
      sessions:   Arc::clone(&self.sessions),
      accounts:   self.accounts.clone(),
      reconciler: self.reconciler.clone(),
      analytics:  self.analytics.clone(),
    }
  }
}

impl<S: DashboardStore> AppState<S> {
  pub fn new(
    store:    Arc<S>,
    sessions: SessionIssuer,
    verifier: Arc<dyn AssertionVerifier>,
    clock:    Arc<dyn Clock>,
  ) -> Self {
    Self {
      accounts:   Accounts::new(Arc::clone(&store)),
      reconciler: IdentityReconciler::new(Arc::clone(&store), verifier),
      analytics:  Analytics::new(Arc::clone(&store), clock),
      sessions:   Arc::new(sessions),
      store,
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the API [`Router`].
pub fn router<S>(state: AppState<S>) -> Router
where
  S: DashboardStore + 'static,
{
  let protected = Router::new()
    .route("/api/auth/verify-token",             get(auth::verify_token))
    .route("/api/dashboard/summary",             get(dashboard::summary::<S>))
    .route("/api/dashboard/total-users",         get(dashboard::total_users::<S>))
    .route("/api/dashboard/traffic-by-device",   get(dashboard::traffic_by_device::<S>))
    .route("/api/dashboard/traffic-by-location", get(dashboard::traffic_by_location::<S>))
    .route_layer(middleware::from_fn_with_state(state.clone(), gate::require_session::<S>));

  Router::new()
    .route("/api/auth/signup",       post(auth::signup::<S>))
    .route("/api/auth/login",        post(auth::login::<S>))
    .route("/api/auth/google-login", post(auth::google_login::<S>))
    .route("/api/health-check",      get(health::check))
    .merge(protected)
    .merge(docs::routes())
    .fallback(not_found)
    .method_not_allowed_fallback(method_not_allowed)
    .layer(TraceLayer::new_for_http())
    .layer(CatchPanicLayer::custom(panic_response))
    .with_state(state)
}

async fn not_found() -> ApiError { ApiError::NotFound("Resource not found.") }

async fn method_not_allowed() -> ApiError { ApiError::MethodNotAllowed }

/// Turn a handler panic into an enveloped 500.
fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
  let detail = panic
    .downcast_ref::<String>()
    .cloned()
    .or_else(|| panic.downcast_ref::<&str>().map(|s| (*s).to_owned()))
    .unwrap_or_else(|| "non-string panic payload".to_owned());
  ApiError::Internal(format!("handler panicked: {detail}")).into_response()
}
