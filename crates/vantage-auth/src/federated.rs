//! Federated login: turning a verified identity assertion into a local user.

use std::sync::Arc;

use async_trait::async_trait;
use vantage_core::{
  store::{DashboardStore, StoreError as _},
  user::{NewUser, User},
};

use crate::{AuthError, Result};

/// How many times a login that collides with a concurrent write is retried
/// as a fresh lookup.
const MAX_ATTEMPTS: usize = 3;

/// Identity claims extracted from a verified assertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FederatedClaims {
  /// The provider's stable subject identifier.
  pub subject: String,
  pub email:   String,
  /// Display name; falls back to the email when the provider omits it.
  pub name:    String,
}

/// Verifies an identity provider's signed assertion.
#[async_trait]
pub trait AssertionVerifier: Send + Sync {
  /// Fails with [`AuthError::InvalidAssertion`] if the assertion cannot be
  /// trusted.
  async fn verify(&self, assertion: &str) -> Result<FederatedClaims>;
}

/// Resolves federated logins to user records, linking or creating as needed.
pub struct IdentityReconciler<S> {
  store:    Arc<S>,
  verifier: Arc<dyn AssertionVerifier>,
}

impl<S> Clone for IdentityReconciler<S> {
  fn clone(&self) -> Self {
    Self { store: Arc::clone(&self.store), verifier: Arc::clone(&self.verifier) }
  }
}

impl<S: DashboardStore> IdentityReconciler<S> {
  pub fn new(store: Arc<S>, verifier: Arc<dyn AssertionVerifier>) -> Self {
    Self { store, verifier }
  }

  /// Verify `assertion` and resolve it to a user.
  pub async fn login(&self, assertion: &str) -> Result<User> {
    let claims = self.verifier.verify(assertion).await?;
    self.reconcile(&claims).await
  }

  /// Resolve already-verified claims to a user:
  ///
  /// 1. the user already holding `subject`;
  /// 2. else the user with the same email, which gets `subject` attached;
  /// 3. else a new federated-only user.
  ///
  /// A uniqueness conflict means a concurrent login got there first, so the
  /// whole resolution is retried as a lookup.
  pub async fn reconcile(&self, claims: &FederatedClaims) -> Result<User> {
    for attempt in 1..=MAX_ATTEMPTS {
      if let Some(user) = self
        .store
        .find_user_by_federated_id(&claims.subject)
        .await
        .map_err(AuthError::store)?
      {
        return Ok(user);
      }

      let existing = self
        .store
        .find_user_by_email(&claims.email)
        .await
        .map_err(AuthError::store)?;

      let outcome = match existing {
        Some(user) => {
          let linked = self.store.link_federated_id(user.user_id, &claims.subject).await;
          if linked.is_ok() {
            tracing::info!(user_id = %user.user_id, "linked federated identity to existing account");
          }
          linked
        }
        None => {
          let created = self
            .store
            .create_user(NewUser::federated(&claims.name, &claims.email, &claims.subject))
            .await;
          if let Ok(user) = &created {
            tracing::info!(user_id = %user.user_id, "created account from federated login");
          }
          created
        }
      };

      match outcome {
        Ok(user) => return Ok(user),
        Err(e) => match e.conflict() {
          Some(conflict) => {
            tracing::warn!(attempt, ?conflict, "federated login raced a concurrent write; retrying");
          }
          None => return Err(AuthError::store(e)),
        },
      }
    }

    Err(AuthError::ReconcileContention(claims.subject.clone()))
  }
}
