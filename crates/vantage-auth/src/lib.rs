//! Authentication for Vantage: password accounts, federated login and
//! stateless session tokens.
//!
//! Nothing in this crate keeps per-session state. A session is a signed
//! token; every protected request re-verifies it and re-reads the user.

pub mod accounts;
pub mod error;
pub mod federated;
pub mod google;
pub mod password;
pub mod session;

pub use accounts::Accounts;
pub use error::{AuthError, Result};
pub use federated::{AssertionVerifier, FederatedClaims, IdentityReconciler};
pub use google::GoogleVerifier;
pub use session::{SessionClaims, SessionIssuer};
