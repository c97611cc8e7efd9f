//! Password hashing and verification.
//!
//! Argon2id with a random per-password salt, stored as a PHC string.

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
  password_hash::{self, SaltString},
};
use rand_core::OsRng;

use crate::{AuthError, Result};

/// Hash `password`, returning `$argon2id$v=19$m=…,t=…,p=…$salt$hash`.
pub fn hash_password(password: &str) -> Result<String> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|h| h.to_string())
    .map_err(|e| AuthError::Hashing(e.to_string()))
}

/// `Ok(false)` on mismatch; `Err` only when `hash` is not a usable PHC string.
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
  let parsed = PasswordHash::new(hash).map_err(|e| AuthError::Hashing(e.to_string()))?;

  match Argon2::default().verify_password(password.as_bytes(), &parsed) {
    Ok(()) => Ok(true),
    Err(password_hash::Error::Password) => Ok(false),
    Err(e) => Err(AuthError::Hashing(e.to_string())),
  }
}
