//! Request-body validation.
//!
//! One function per request shape. Each takes the raw JSON body and returns
//! either the typed input or [`ApiError::Validation`] with every failing
//! field listed.

use axum::{Json, extract::rejection::JsonRejection};
use serde_json::{Map, Value};
use utoipa::ToSchema;

use crate::error::{ApiError, ApiResult, FieldErrors};

const MISSING: &str = "Missing data for required field.";
const NOT_A_STRING: &str = "Not a valid string.";
const EMPTY: &str = "Field may not be empty.";
const BAD_EMAIL: &str = "Not a valid email address.";
const UNKNOWN: &str = "Unknown field.";

pub const INVALID_FORMAT: &str = "Invalid request format.";

#[derive(Debug, PartialEq, Eq, ToSchema)]
pub struct SignupInput {
  #[schema(example = "Ada Lovelace")]
  pub name:     String,
  #[schema(example = "ada@example.com")]
  pub email:    String,
  pub password: String,
}

#[derive(Debug, PartialEq, Eq, ToSchema)]
pub struct LoginInput {
  #[schema(example = "ada@example.com")]
  pub email:    String,
  pub password: String,
}

#[derive(Debug, PartialEq, Eq, ToSchema)]
pub struct GoogleLoginInput {
  /// ID token returned by Google Identity Services.
  pub id_token: String,
}

/// Unwrap an optional JSON body, mapping any extraction failure (wrong
/// content type, syntax error) to a 400.
pub fn json_body(payload: Result<Json<Value>, JsonRejection>) -> ApiResult<Value> {
  payload.map(|Json(v)| v).map_err(|rejection| {
    tracing::debug!(%rejection, "unreadable request body");
    ApiError::BadRequest(INVALID_FORMAT)
  })
}

pub fn validate_signup(body: &Value) -> ApiResult<SignupInput> {
  let mut fields = Fields::new(body, &["name", "email", "password"])?;
  let name = fields.string("name");
  let email = fields.email("email");
  let password = fields.string("password");
  fields.finish()?;

  match (name, email, password) {
    (Some(name), Some(email), Some(password)) => Ok(SignupInput { name, email, password }),
    _ => Err(ApiError::BadRequest(INVALID_FORMAT)),
  }
}

pub fn validate_login(body: &Value) -> ApiResult<LoginInput> {
  let mut fields = Fields::new(body, &["email", "password"])?;
  let email = fields.email("email");
  let password = fields.string("password");
  fields.finish()?;

  match (email, password) {
    (Some(email), Some(password)) => Ok(LoginInput { email, password }),
    _ => Err(ApiError::BadRequest(INVALID_FORMAT)),
  }
}

pub fn validate_google_login(body: &Value) -> ApiResult<GoogleLoginInput> {
  let mut fields = Fields::new(body, &["id_token"])?;
  let id_token = fields.string("id_token");
  fields.finish()?;

  id_token
    .map(|id_token| GoogleLoginInput { id_token })
    .ok_or(ApiError::BadRequest(INVALID_FORMAT))
}

/// Loose structural check: one `@`, a non-empty local part, and a dotted
/// domain with no empty labels. Deliverability is not our concern.
pub fn is_valid_email(email: &str) -> bool {
  if email.chars().any(char::is_whitespace) {
    return false;
  }
  let Some((local, domain)) = email.split_once('@') else {
    return false;
  };
  !local.is_empty()
    && !domain.contains('@')
    && domain.contains('.')
    && domain.split('.').all(|label| !label.is_empty())
}

// ─── Field collector ──────────────────────────────────────────────────────────

struct Fields<'a> {
  body:   &'a Map<String, Value>,
  errors: FieldErrors,
}

impl<'a> Fields<'a> {
  fn new(body: &'a Value, allowed: &[&str]) -> ApiResult<Self> {
    let body = body.as_object().ok_or(ApiError::BadRequest(INVALID_FORMAT))?;
    let mut errors = FieldErrors::new();
    for key in body.keys().filter(|k| !allowed.contains(&k.as_str())) {
      errors.insert(key.clone(), vec![UNKNOWN.to_owned()]);
    }
    Ok(Self { body, errors })
  }

  fn reject(&mut self, key: &str, message: &str) {
    self.errors.entry(key.to_owned()).or_default().push(message.to_owned());
  }

  /// A required, non-blank string.
  fn string(&mut self, key: &str) -> Option<String> {
    let body = self.body;
    match body.get(key) {
      None | Some(Value::Null) => self.reject(key, MISSING),
      Some(Value::String(s)) if s.trim().is_empty() => self.reject(key, EMPTY),
      Some(Value::String(s)) => return Some(s.clone()),
      Some(_) => self.reject(key, NOT_A_STRING),
    }
    None
  }

  fn email(&mut self, key: &str) -> Option<String> {
    let value = self.string(key)?;
    if is_valid_email(&value) {
      Some(value)
    } else {
      self.reject(key, BAD_EMAIL);
      None
    }
  }

  fn finish(self) -> ApiResult<()> {
    if self.errors.is_empty() { Ok(()) } else { Err(ApiError::Validation(self.errors)) }
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  fn field_errors(result: ApiResult<impl std::fmt::Debug>) -> FieldErrors {
    match result {
      Err(ApiError::Validation(errors)) => errors,
      other => panic!("expected validation error, got {other:?}"),
    }
  }

  #[test]
  fn signup_accepts_complete_body() {
    let input = validate_signup(&json!({
      "name": "Ada", "email": "ada@example.com", "password": "hunter2"
    }))
    .unwrap();
    assert_eq!(input.name, "Ada");
    assert_eq!(input.email, "ada@example.com");
  }

  #[test]
  fn signup_reports_every_bad_field() {
    let errors = field_errors(validate_signup(&json!({ "email": "nope", "password": 7 })));
    assert_eq!(errors["name"], vec![MISSING]);
    assert_eq!(errors["email"], vec![BAD_EMAIL]);
    assert_eq!(errors["password"], vec![NOT_A_STRING]);
  }

  #[test]
  fn unknown_fields_are_rejected() {
    let errors = field_errors(validate_login(&json!({
      "email": "ada@example.com", "password": "x", "remember": true
    })));
    assert_eq!(errors.len(), 1);
    assert_eq!(errors["remember"], vec![UNKNOWN]);
  }

  #[test]
  fn blank_strings_are_rejected() {
    let errors = field_errors(validate_google_login(&json!({ "id_token": "  " })));
    assert_eq!(errors["id_token"], vec![EMPTY]);
  }

  #[test]
  fn non_object_body_is_a_format_error() {
    assert!(matches!(
      validate_login(&json!(["ada@example.com", "x"])),
      Err(ApiError::BadRequest(INVALID_FORMAT))
    ));
  }

  #[test]
  fn email_shape() {
    assert!(is_valid_email("a@b.co"));
    assert!(is_valid_email("first.last+tag@sub.example.org"));
    assert!(!is_valid_email("plain"));
    assert!(!is_valid_email("@example.com"));
    assert!(!is_valid_email("a@localhost"));
    assert!(!is_valid_email("a@b..com"));
    assert!(!is_valid_email("a b@example.com"));
    assert!(!is_valid_email("a@b@c.com"));
  }
}
