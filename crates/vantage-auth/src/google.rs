//! Google ID-token verification.

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header, jwk::JwkSet};
use serde::Deserialize;

use crate::{AssertionVerifier, AuthError, FederatedClaims, Result};

pub const GOOGLE_JWKS_URL: &str = "https://www.googleapis.com/oauth2/v3/certs";
const GOOGLE_ISSUERS: [&str; 2] = ["accounts.google.com", "https://accounts.google.com"];

#[derive(Debug, Deserialize)]
struct GoogleClaims {
  sub:            String,
  email:          Option<String>,
  #[serde(default)]
  email_verified: bool,
  name:           Option<String>,
}

impl GoogleClaims {
  /// Only a verified address may be matched against existing accounts.
  fn into_federated(self) -> Result<FederatedClaims> {
    let email = self
      .email
      .ok_or_else(|| AuthError::InvalidAssertion("token carries no email".into()))?;
    if !self.email_verified {
      return Err(AuthError::InvalidAssertion(format!("email {email:?} is not verified")));
    }
    Ok(FederatedClaims {
      name: self.name.unwrap_or_else(|| email.clone()),
      subject: self.sub,
      email,
    })
  }
}

/// Verifies Google ID tokens against Google's published signing keys.
///
/// Without a configured client id every assertion is rejected, which keeps
/// the server usable for password accounts when federated login is not set
/// up.
#[derive(Debug, Clone)]
pub struct GoogleVerifier {
  client_id: Option<String>,
  jwks_url:  String,
  http:      reqwest::Client,
}

impl GoogleVerifier {
  pub fn new(client_id: Option<String>) -> Self {
    Self {
      client_id,
      jwks_url: GOOGLE_JWKS_URL.to_owned(),
      http: reqwest::Client::new(),
    }
  }

  /// Override where signing keys are fetched from.
  pub fn with_jwks_url(mut self, url: impl Into<String>) -> Self {
    self.jwks_url = url.into();
    self
  }

  async fn fetch_keys(&self) -> Result<JwkSet> {
    let response = self
      .http
      .get(&self.jwks_url)
      .send()
      .await
      .and_then(reqwest::Response::error_for_status)
      .map_err(|e| AuthError::Provider(format!("fetching signing keys: {e}")))?;

    response
      .json::<JwkSet>()
      .await
      .map_err(|e| AuthError::Provider(format!("decoding signing keys: {e}")))
  }
}

#[async_trait]
impl AssertionVerifier for GoogleVerifier {
  async fn verify(&self, assertion: &str) -> Result<FederatedClaims> {
    let Some(client_id) = self.client_id.as_deref() else {
      return Err(AuthError::InvalidAssertion("federated login is not configured".into()));
    };

    let header = decode_header(assertion)
      .map_err(|e| AuthError::InvalidAssertion(format!("malformed token: {e}")))?;
    let kid = header
      .kid
      .ok_or_else(|| AuthError::InvalidAssertion("token has no key id".into()))?;

    let keys = self.fetch_keys().await?;
    let jwk = keys
      .find(&kid)
      .ok_or_else(|| AuthError::InvalidAssertion(format!("unknown signing key {kid:?}")))?;
    let key = DecodingKey::from_jwk(jwk)
      .map_err(|e| AuthError::Provider(format!("unusable signing key {kid:?}: {e}")))?;

    let mut validation = Validation::new(Algorithm::RS256);
    validation.set_audience(&[client_id]);
    validation.set_issuer(&GOOGLE_ISSUERS);

    decode::<GoogleClaims>(assertion, &key, &validation)
      .map_err(|e| AuthError::InvalidAssertion(e.to_string()))?
      .claims
      .into_federated()
  }
}
