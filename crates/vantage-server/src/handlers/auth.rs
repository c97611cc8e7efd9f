//! Signup, login and token-check handlers.

use axum::{
  Json,
  extract::{State, rejection::JsonRejection},
  http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;
use vantage_core::{store::DashboardStore, user::User};

use crate::{
  AppState,
  envelope::Envelope,
  error::ApiResult,
  gate::CurrentUser,
  validation::{
    GoogleLoginInput, LoginInput, SignupInput, json_body, validate_google_login, validate_login,
    validate_signup,
  },
};

/// Returned by every successful login.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionGrant {
  pub user_id: Uuid,
  pub token:   String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Profile {
  pub id:         Uuid,
  pub name:       String,
  pub email:      String,
  pub created_at: DateTime<Utc>,
}

impl From<User> for Profile {
  fn from(user: User) -> Self {
    Self { id: user.user_id, name: user.name, email: user.email, created_at: user.created_at }
  }
}

fn grant<S: DashboardStore>(state: &AppState<S>, user: &User) -> ApiResult<SessionGrant> {
  let token = state.sessions.issue(user.user_id)?;
  Ok(SessionGrant { user_id: user.user_id, token })
}

/// `POST /api/auth/signup`
#[utoipa::path(
  post,
  path = "/api/auth/signup",
  tag = "Auth",
  summary = "Register a password account",
  request_body = SignupInput,
  responses(
    (status = 201, description = "Account created; session token issued", body = Envelope<SessionGrant>),
    (status = 400, description = "Malformed body or invalid fields"),
    (status = 409, description = "Email already registered"),
  )
)]
pub async fn signup<S: DashboardStore + 'static>(
  State(state): State<AppState<S>>,
  payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Envelope<SessionGrant>>)> {
  let input = validate_signup(&json_body(payload)?)?;
  let user = state.accounts.signup(&input.name, &input.email, &input.password).await?;

  Ok((StatusCode::CREATED, Envelope::success(grant(&state, &user)?, "User created successfully!")))
}

/// `POST /api/auth/login`
#[utoipa::path(
  post,
  path = "/api/auth/login",
  tag = "Auth",
  summary = "Log in with email and password",
  request_body = LoginInput,
  responses(
    (status = 200, description = "Session token issued", body = Envelope<SessionGrant>),
    (status = 400, description = "Malformed body or invalid fields"),
    (status = 401, description = "Invalid credentials"),
  )
)]
pub async fn login<S: DashboardStore + 'static>(
  State(state): State<AppState<S>>,
  payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<Envelope<SessionGrant>>> {
  let input = validate_login(&json_body(payload)?)?;
  let user = state.accounts.login(&input.email, &input.password).await?;
  tracing::info!(user_id = %user.user_id, "password login");

  Ok(Envelope::success(grant(&state, &user)?, "Login successful!"))
}

/// `POST /api/auth/google-login`
#[utoipa::path(
  post,
  path = "/api/auth/google-login",
  tag = "Auth",
  summary = "Log in or register with a Google ID token",
  description = "Links the Google identity onto an existing account with the same verified email, or creates a new account.",
  request_body = GoogleLoginInput,
  responses(
    (status = 200, description = "Session token issued", body = Envelope<SessionGrant>),
    (status = 400, description = "Malformed body or invalid fields"),
    (status = 401, description = "ID token rejected"),
    (status = 500, description = "Identity provider unavailable"),
  )
)]
pub async fn google_login<S: DashboardStore + 'static>(
  State(state): State<AppState<S>>,
  payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<Envelope<SessionGrant>>> {
  let input = validate_google_login(&json_body(payload)?)?;
  let user = state.reconciler.login(&input.id_token).await?;
  tracing::info!(user_id = %user.user_id, "federated login");

  Ok(Envelope::success(grant(&state, &user)?, "Google login successful!"))
}

/// `GET /api/auth/verify-token`
#[utoipa::path(
  get,
  path = "/api/auth/verify-token",
  tag = "Auth",
  summary = "Resolve the bearer token to its user",
  security(("bearer_auth" = [])),
  responses(
    (status = 200, description = "Token is valid", body = Envelope<Profile>),
    (status = 401, description = "Missing, invalid or expired token"),
  )
)]
pub async fn verify_token(CurrentUser(user): CurrentUser) -> Json<Envelope<Profile>> {
  Envelope::success(Profile::from(user), "Token is valid.")
}
