//! The `DashboardStore` trait and its conflict classification.
//!
//! The trait is implemented by storage backends (e.g. `vantage-store-sqlite`).
//! Higher layers (`vantage-auth`, `vantage-server`) depend on this
//! abstraction, not on any concrete backend.

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  event::{Dimension, Event, EventType, LabelCount, MonthCount, NewEvent},
  summary::SummarySnapshot,
  user::{NewUser, User},
};

// ─── Errors ──────────────────────────────────────────────────────────────────

/// A uniqueness constraint the store refused to violate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conflict {
  Email,
  FederatedId,
}

/// Backend errors must say whether they are a uniqueness violation, so that
/// callers can turn races into `EmailTaken` or a retried lookup.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  fn conflict(&self) -> Option<Conflict>;
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a Vantage storage backend.
///
/// Every write runs in its own transaction: it either commits completely or
/// leaves no trace. Events are append-only.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait DashboardStore: Send + Sync {
  type Error: StoreError;

  // ── Users ─────────────────────────────────────────────────────────────

  /// Persist a new user. Fails with a [`Conflict`] error if the email or
  /// federated id is already taken.
  fn create_user(
    &self,
    input: NewUser,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  /// Retrieve a user by id. Returns `None` if not found.
  fn get_user(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  /// Exact-match lookup by email.
  fn find_user_by_email<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + 'a;

  fn find_user_by_federated_id<'a>(
    &'a self,
    federated_id: &'a str,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + 'a;

  /// Attach a federated id to an existing user, keeping any password hash.
  /// Fails with [`Conflict::FederatedId`] if another user already holds it.
  fn link_federated_id<'a>(
    &'a self,
    user_id: Uuid,
    federated_id: &'a str,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + 'a;

  // ── Events ────────────────────────────────────────────────────────────

  /// Append an event to the log.
  fn record_event(
    &self,
    input: NewEvent,
  ) -> impl Future<Output = Result<Event, Self::Error>> + Send + '_;

  /// Count events of `event_type` in calendar `year`, grouped by month.
  /// Months without events are absent from the result.
  fn count_by_month<'a>(
    &'a self,
    event_type: &'a EventType,
    year: i32,
  ) -> impl Future<Output = Result<Vec<MonthCount>, Self::Error>> + Send + 'a;

  /// Count events of `event_type` at or after `since`, grouped by
  /// `dimension`. Events whose dimension is null are skipped. Order is
  /// unspecified.
  fn count_by_dimension<'a>(
    &'a self,
    event_type: &'a EventType,
    dimension: Dimension,
    since: DateTime<Utc>,
  ) -> impl Future<Output = Result<Vec<LabelCount>, Self::Error>> + Send + 'a;

  // ── Summary snapshot ──────────────────────────────────────────────────

  /// The current snapshot, if one has been written.
  fn summary(
    &self,
  ) -> impl Future<Output = Result<Option<SummarySnapshot>, Self::Error>> + Send + '_;

  /// Replace the snapshot wholesale.
  fn replace_summary(
    &self,
    snapshot: SummarySnapshot,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
