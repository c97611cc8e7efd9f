//! Stateless session tokens.
//!
//! A session is an HS256 JWT carrying the user id and a 24-hour lifetime.
//! Verification checks the signature and expiry only: there is no
//! revocation list and no server-side session store.

use std::sync::Arc;

use chrono::Duration;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use vantage_core::clock::Clock;

use crate::{AuthError, Result};

/// How long a freshly issued token stays valid.
pub const SESSION_TTL_HOURS: i64 = 24;

/// Shortest accepted HMAC secret.
pub const MIN_SECRET_LEN: usize = 32;

/// Claims embedded in every session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
  pub user_id: Uuid,
  /// Issued at (Unix seconds).
  #[serde(rename = "iat")]
  pub issued_at: i64,
  /// Expiry (Unix seconds). The token is valid strictly before this instant.
  #[serde(rename = "exp")]
  pub expires_at: i64,
}

/// Mints and verifies session tokens with a process-wide secret.
pub struct SessionIssuer {
  encoding_key: EncodingKey,
  decoding_key: DecodingKey,
  validation:   Validation,
  clock:        Arc<dyn Clock>,
}

impl std::fmt::Debug for SessionIssuer {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("SessionIssuer").finish_non_exhaustive()
  }
}

impl SessionIssuer {
  pub fn new(secret: &[u8], clock: Arc<dyn Clock>) -> Result<Self> {
    if secret.len() < MIN_SECRET_LEN {
      return Err(AuthError::WeakSecret(MIN_SECRET_LEN));
    }

    // Expiry is checked against the injected clock rather than the system
    // time, so the library's own check is disabled.
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = false;
    validation.required_spec_claims.clear();

    Ok(Self {
      encoding_key: EncodingKey::from_secret(secret),
      decoding_key: DecodingKey::from_secret(secret),
      validation,
      clock,
    })
  }

  /// Sign a token for `user_id`, valid for [`SESSION_TTL_HOURS`] from now.
  pub fn issue(&self, user_id: Uuid) -> Result<String> {
    let now = self.clock.now();
    let claims = SessionClaims {
      user_id,
      issued_at: now.timestamp(),
      expires_at: (now + Duration::hours(SESSION_TTL_HOURS)).timestamp(),
    };

    encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
      .map_err(|e| AuthError::Signing(e.to_string()))
  }

  /// Check signature and expiry and return the embedded user id.
  pub fn verify(&self, token: &str) -> Result<Uuid> {
    Ok(self.decode(token)?.user_id)
  }

  /// Like [`verify`](Self::verify) but returns every claim.
  pub fn decode(&self, token: &str) -> Result<SessionClaims> {
    let data = decode::<SessionClaims>(token, &self.decoding_key, &self.validation).map_err(|e| {
      tracing::debug!("session token rejected: {e}");
      AuthError::TokenInvalid
    })?;

    if self.clock.now().timestamp() >= data.claims.expires_at {
      return Err(AuthError::TokenExpired);
    }
    Ok(data.claims)
  }
}

#[cfg(test)]
mod tests {
  use chrono::{TimeZone as _, Utc};
  use vantage_core::clock::ManualClock;

  use super::*;

  const SECRET: &[u8] = b"test-secret-key-at-least-32-bytes!";

  fn issuer() -> (SessionIssuer, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()));
    let issuer = SessionIssuer::new(SECRET, clock.clone()).unwrap();
    (issuer, clock)
  }

  #[test]
  fn issue_then_verify() {
    let (issuer, _) = issuer();
    let user_id = Uuid::new_v4();
    let token = issuer.issue(user_id).unwrap();
    assert_eq!(issuer.verify(&token).unwrap(), user_id);
  }

  #[test]
  fn claims_span_exactly_one_day() {
    let (issuer, clock) = issuer();
    let token = issuer.issue(Uuid::new_v4()).unwrap();
    let claims = issuer.decode(&token).unwrap();
    assert_eq!(claims.issued_at, clock.now().timestamp());
    assert_eq!(claims.expires_at - claims.issued_at, 24 * 60 * 60);
  }

  #[test]
  fn token_expires_after_24_hours() {
    let (issuer, clock) = issuer();
    let token = issuer.issue(Uuid::new_v4()).unwrap();

    clock.advance(Duration::hours(24) - Duration::seconds(1));
    assert!(issuer.verify(&token).is_ok());

    clock.advance(Duration::seconds(1));
    assert!(matches!(issuer.verify(&token), Err(AuthError::TokenExpired)));
  }

  #[test]
  fn tampered_or_foreign_tokens_are_invalid() {
    let (issuer, clock) = issuer();
    let token = issuer.issue(Uuid::new_v4()).unwrap();

    let (head, signature) = token.rsplit_once('.').unwrap();
    let flipped = if signature.starts_with('A') { 'B' } else { 'A' };
    let tampered = format!("{head}.{flipped}{}", &signature[1..]);
    assert!(matches!(issuer.verify(&tampered), Err(AuthError::TokenInvalid)));

    let other = SessionIssuer::new(b"a-completely-different-32-byte-secret", clock).unwrap();
    let foreign = other.issue(Uuid::new_v4()).unwrap();
    assert!(matches!(issuer.verify(&foreign), Err(AuthError::TokenInvalid)));

    assert!(matches!(issuer.verify("not.a.jwt"), Err(AuthError::TokenInvalid)));
    assert!(matches!(issuer.verify(""), Err(AuthError::TokenInvalid)));
  }

  #[test]
  fn short_secret_is_rejected() {
    let clock = Arc::new(ManualClock::new(Utc::now()));
    assert!(matches!(
      SessionIssuer::new(b"short", clock),
      Err(AuthError::WeakSecret(MIN_SECRET_LEN))
    ));
  }
}
