//! Password accounts: signup and login.

use std::sync::Arc;

use vantage_core::{
  store::{Conflict, DashboardStore, StoreError as _},
  user::{NewUser, User},
};

use crate::{
  AuthError, Result,
  password::{hash_password, verify_password},
};

/// The password path of the credential store.
pub struct Accounts<S> {
  store: Arc<S>,
}

impl<S> Clone for Accounts<S> {
  fn clone(&self) -> Self { Self { store: Arc::clone(&self.store) } }
}

impl<S: DashboardStore> Accounts<S> {
  pub fn new(store: Arc<S>) -> Self { Self { store } }

  /// Register a password account.
  ///
  /// The email pre-check only gives a fast answer; the store's unique
  /// constraint decides races between concurrent signups.
  pub async fn signup(&self, name: &str, email: &str, password: &str) -> Result<User> {
    if self
      .store
      .find_user_by_email(email)
      .await
      .map_err(AuthError::store)?
      .is_some()
    {
      return Err(AuthError::EmailTaken);
    }

    let hash = hash_password(password)?;

    match self.store.create_user(NewUser::with_password(name, email, hash)).await {
      Ok(user) => {
        tracing::info!(user_id = %user.user_id, "user signed up");
        Ok(user)
      }
      Err(e) if e.conflict() == Some(Conflict::Email) => {
        tracing::warn!("concurrent signup lost the race for its email");
        Err(AuthError::EmailTaken)
      }
      Err(e) => Err(AuthError::store(e)),
    }
  }

  /// Check an email/password pair.
  ///
  /// Unknown email, federated-only account and wrong password all return
  /// [`AuthError::InvalidCredentials`].
  pub async fn login(&self, email: &str, password: &str) -> Result<User> {
    let user = self
      .store
      .find_user_by_email(email)
      .await
      .map_err(AuthError::store)?
      .ok_or(AuthError::InvalidCredentials)?;

    let hash = user.password_hash.as_deref().ok_or(AuthError::InvalidCredentials)?;

    match verify_password(password, hash) {
      Ok(true) => Ok(user),
      Ok(false) => Err(AuthError::InvalidCredentials),
      Err(e) => {
        tracing::error!(user_id = %user.user_id, "stored password hash unusable: {e}");
        Err(AuthError::InvalidCredentials)
      }
    }
  }
}
