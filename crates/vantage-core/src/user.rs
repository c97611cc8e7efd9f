//! User accounts.
//!
//! A user authenticates with a password, a federated identity, or both once a
//! password account has been linked to a federated login.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// A persisted user record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  pub user_id:       Uuid,
  pub name:          String,
  /// Unique across all users; compared exactly as stored.
  pub email:         String,
  /// PHC string, e.g. `$argon2id$v=19$…`. Never serialised.
  #[serde(skip_serializing, default)]
  pub password_hash: Option<String>,
  /// Subject identifier issued by the identity provider.
  #[serde(skip_serializing_if = "Option::is_none", default)]
  pub federated_id:  Option<String>,
  pub created_at:    DateTime<Utc>,
}

impl User {
  /// Enforce the invariant that at least one credential is present.
  pub fn check_credentials(&self) -> Result<()> {
    if self.password_hash.is_none() && self.federated_id.is_none() {
      return Err(Error::MissingCredential);
    }
    Ok(())
  }
}

/// How a new account proves its identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
  /// An already-hashed password (PHC string).
  Password(String),
  /// The identity provider's subject identifier.
  Federated(String),
}

/// Input for [`DashboardStore::create_user`](crate::store::DashboardStore::create_user).
///
/// Holding exactly one [`Credential`] makes a credential-less account
/// unrepresentable.
#[derive(Debug, Clone)]
pub struct NewUser {
  pub name:       String,
  pub email:      String,
  pub credential: Credential,
}

impl NewUser {
  pub fn with_password(
    name: impl Into<String>,
    email: impl Into<String>,
    password_hash: impl Into<String>,
  ) -> Self {
    Self {
      name:       name.into(),
      email:      email.into(),
      credential: Credential::Password(password_hash.into()),
    }
  }

  pub fn federated(
    name: impl Into<String>,
    email: impl Into<String>,
    federated_id: impl Into<String>,
  ) -> Self {
    Self {
      name:       name.into(),
      email:      email.into(),
      credential: Credential::Federated(federated_id.into()),
    }
  }

  pub fn password_hash(&self) -> Option<&str> {
    match &self.credential {
      Credential::Password(h) => Some(h),
      Credential::Federated(_) => None,
    }
  }

  pub fn federated_id(&self) -> Option<&str> {
    match &self.credential {
      Credential::Federated(id) => Some(id),
      Credential::Password(_) => None,
    }
  }
}
