//! Session gate for protected routes.
//!
//! [`require_session`] runs as middleware in front of every protected route:
//! it checks the bearer token, loads the user and stores it in the request
//! extensions, where handlers pick it up through [`CurrentUser`].

use axum::{
  extract::{FromRequestParts, Request, State},
  http::{HeaderMap, header::AUTHORIZATION, request::Parts},
  middleware::Next,
  response::Response,
};
use vantage_auth::AuthError;
use vantage_core::{store::DashboardStore, user::User};

use crate::{AppState, error::ApiError};

/// The user a request was authenticated as.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Extract the token from an `Authorization: Bearer <token>` header.
///
/// Anything else (another scheme, extra spaces, an empty token) counts as no
/// token at all.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
  let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
  let token = value.strip_prefix("Bearer ")?;
  (!token.is_empty() && !token.contains(char::is_whitespace)).then_some(token)
}

pub async fn require_session<S: DashboardStore + 'static>(
  State(state): State<AppState<S>>,
  mut req: Request,
  next: Next,
) -> Result<Response, ApiError> {
  let token = bearer_token(req.headers()).ok_or(AuthError::MissingToken)?;
  let user_id = state.sessions.verify(token)?;

  let user = state
    .store
    .get_user(user_id)
    .await
    .map_err(AuthError::store)?
    .ok_or(AuthError::UserNotFound)?;

  req.extensions_mut().insert(CurrentUser(user));
  Ok(next.run(req).await)
}

impl<St: Send + Sync> FromRequestParts<St> for CurrentUser {
  type Rejection = ApiError;

  async fn from_request_parts(parts: &mut Parts, _state: &St) -> Result<Self, Self::Rejection> {
    parts
      .extensions
      .get::<CurrentUser>()
      .cloned()
      .ok_or_else(|| ApiError::Internal("route is not behind the session gate".into()))
  }
}

#[cfg(test)]
mod tests {
  use axum::http::HeaderValue;

  use super::*;

  fn headers(value: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
    headers
  }

  #[test]
  fn accepts_well_formed_bearer() {
    assert_eq!(bearer_token(&headers("Bearer abc.def.ghi")), Some("abc.def.ghi"));
  }

  #[test]
  fn rejects_malformed_headers() {
    assert_eq!(bearer_token(&HeaderMap::new()), None);
    assert_eq!(bearer_token(&headers("Bearer")), None);
    assert_eq!(bearer_token(&headers("Bearer ")), None);
    assert_eq!(bearer_token(&headers("bearer abc")), None);
    assert_eq!(bearer_token(&headers("Basic dXNlcjpwYXNz")), None);
    assert_eq!(bearer_token(&headers("Bearer  abc")), None);
    assert_eq!(bearer_token(&headers("Bearer abc def")), None);
  }
}
