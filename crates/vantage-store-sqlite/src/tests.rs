//! Integration tests for `SqliteStore` against an in-memory database.

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone as _, Utc};
use uuid::Uuid;
use vantage_core::{
  analytics::{Analytics, DeviceTraffic, MonthlyRegistrations},
  clock::ManualClock,
  event::{Dimension, EventType, NewEvent},
  store::{Conflict, DashboardStore, StoreError},
  summary::{Direction, MetricCard, SummarySnapshot},
  user::NewUser,
};

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
  Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
}

// ─── Users ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_and_get_password_user() {
  let s = store().await;

  let user = s
    .create_user(NewUser::with_password("Ada", "ada@example.com", "$argon2id$hash"))
    .await
    .unwrap();
  assert_eq!(user.password_hash.as_deref(), Some("$argon2id$hash"));
  assert!(user.federated_id.is_none());

  let fetched = s.get_user(user.user_id).await.unwrap().unwrap();
  assert_eq!(fetched, user);
}

#[tokio::test]
async fn get_user_missing_returns_none() {
  let s = store().await;
  assert!(s.get_user(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn find_by_email_is_exact_match() {
  let s = store().await;
  s.create_user(NewUser::with_password("Ada", "ada@example.com", "$h"))
    .await
    .unwrap();

  assert!(s.find_user_by_email("ada@example.com").await.unwrap().is_some());
  assert!(s.find_user_by_email("Ada@Example.com").await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_email_is_a_conflict_and_leaves_one_row() {
  let s = store().await;
  let first = s
    .create_user(NewUser::with_password("Ada", "ada@example.com", "$h1"))
    .await
    .unwrap();

  let err = s
    .create_user(NewUser::with_password("Imposter", "ada@example.com", "$h2"))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Conflict(Conflict::Email)));
  assert_eq!(err.conflict(), Some(Conflict::Email));

  let stored = s.find_user_by_email("ada@example.com").await.unwrap().unwrap();
  assert_eq!(stored.user_id, first.user_id);
  assert_eq!(stored.name, "Ada");
}

#[tokio::test]
async fn duplicate_federated_id_is_a_conflict() {
  let s = store().await;
  s.create_user(NewUser::federated("Ada", "ada@example.com", "sub-1"))
    .await
    .unwrap();

  let err = s
    .create_user(NewUser::federated("Ada", "other@example.com", "sub-1"))
    .await
    .unwrap_err();
  assert_eq!(err.conflict(), Some(Conflict::FederatedId));
  assert!(s.find_user_by_email("other@example.com").await.unwrap().is_none());
}

#[tokio::test]
async fn link_federated_id_keeps_password() {
  let s = store().await;
  let user = s
    .create_user(NewUser::with_password("Ada", "ada@example.com", "$h"))
    .await
    .unwrap();

  let linked = s.link_federated_id(user.user_id, "sub-1").await.unwrap();
  assert_eq!(linked.user_id, user.user_id);
  assert_eq!(linked.federated_id.as_deref(), Some("sub-1"));
  assert_eq!(linked.password_hash.as_deref(), Some("$h"));

  let by_sub = s.find_user_by_federated_id("sub-1").await.unwrap().unwrap();
  assert_eq!(by_sub.user_id, user.user_id);

  // Linking the same id again is a no-op.
  let again = s.link_federated_id(user.user_id, "sub-1").await.unwrap();
  assert_eq!(again, linked);
}

#[tokio::test]
async fn link_federated_id_taken_by_other_user_is_a_conflict() {
  let s = store().await;
  s.create_user(NewUser::federated("Ada", "ada@example.com", "sub-1"))
    .await
    .unwrap();
  let bob = s
    .create_user(NewUser::with_password("Bob", "bob@example.com", "$h"))
    .await
    .unwrap();

  let err = s.link_federated_id(bob.user_id, "sub-1").await.unwrap_err();
  assert!(matches!(err, Error::Conflict(Conflict::FederatedId)));

  let bob_now = s.get_user(bob.user_id).await.unwrap().unwrap();
  assert!(bob_now.federated_id.is_none());
}

#[tokio::test]
async fn link_federated_id_unknown_user() {
  let s = store().await;
  let id = Uuid::new_v4();
  assert!(matches!(
    s.link_federated_id(id, "sub-1").await,
    Err(Error::UserNotFound(missing)) if missing == id
  ));
}

#[tokio::test]
async fn created_at_comes_from_injected_clock() {
  let clock = Arc::new(ManualClock::new(at(2024, 6, 15)));
  let s = store().await.with_clock(clock.clone());

  let first = s
    .create_user(NewUser::with_password("Ada", "ada@example.com", "$argon2id$hash"))
    .await
    .unwrap();
  assert_eq!(first.created_at, at(2024, 6, 15));

  clock.advance(Duration::days(3));
  let second = s
    .create_user(NewUser::federated("Bob", "bob@example.com", "sub-bob"))
    .await
    .unwrap();
  assert_eq!(second.created_at, at(2024, 6, 18));

  let fetched = s.get_user(second.user_id).await.unwrap().unwrap();
  assert_eq!(fetched.created_at, at(2024, 6, 18));
}

// ─── Events ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn record_event_roundtrips_fields() {
  let s = store().await;
  let user_id = Uuid::new_v4();
  let event = s
    .record_event(
      NewEvent::new(EventType::Other("checkout".into()), at(2024, 5, 2))
        .device("Mac")
        .location("Canada")
        .user(user_id),
    )
    .await
    .unwrap();
  assert_eq!(event.event_type.as_str(), "checkout");
  assert_eq!(event.user_id, Some(user_id));
  assert_eq!(event.value, 1.0);
}

#[tokio::test]
async fn count_by_month_uses_event_year_and_month() {
  let s = store().await;
  for ts in [at(2024, 1, 5), at(2024, 1, 31), at(2024, 3, 1), at(2023, 3, 1)] {
    s.record_event(NewEvent::new(EventType::NewRegistration, ts)).await.unwrap();
  }
  // Other types and boundary years are ignored.
  s.record_event(NewEvent::new(EventType::PageView, at(2024, 1, 5))).await.unwrap();
  s.record_event(NewEvent::new(EventType::NewRegistration, Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()))
    .await
    .unwrap();
  s.record_event(NewEvent::new(EventType::NewRegistration, Utc.with_ymd_and_hms(2023, 12, 31, 23, 59, 59).unwrap()))
    .await
    .unwrap();

  let counts = s.count_by_month(&EventType::NewRegistration, 2024).await.unwrap();
  let pairs: Vec<_> = counts.iter().map(|c| (c.month, c.count)).collect();
  assert_eq!(pairs, [(1, 2), (3, 1)]);

  let counts = s.count_by_month(&EventType::NewRegistration, 2023).await.unwrap();
  let pairs: Vec<_> = counts.iter().map(|c| (c.month, c.count)).collect();
  assert_eq!(pairs, [(3, 1), (12, 1)]);
}

#[tokio::test]
async fn count_by_dimension_filters_window_type_and_nulls() {
  let s = store().await;
  let now = at(2024, 6, 30);
  let since = now - Duration::days(30);

  s.record_event(NewEvent::new(EventType::PageView, now).device("iOS")).await.unwrap();
  s.record_event(NewEvent::new(EventType::PageView, since).device("iOS")).await.unwrap();
  s.record_event(NewEvent::new(EventType::PageView, now).device("Mac")).await.unwrap();
  // Excluded: too old, wrong type, null device.
  s.record_event(NewEvent::new(EventType::PageView, since - Duration::seconds(1)).device("Mac"))
    .await
    .unwrap();
  s.record_event(NewEvent::new(EventType::UserLogin, now).device("Mac")).await.unwrap();
  s.record_event(NewEvent::new(EventType::PageView, now).location("Canada")).await.unwrap();

  let mut counts = s
    .count_by_dimension(&EventType::PageView, Dimension::Device, since)
    .await
    .unwrap();
  counts.sort_by(|a, b| a.label.cmp(&b.label));
  let pairs: Vec<_> = counts.iter().map(|c| (c.label.as_str(), c.count)).collect();
  assert_eq!(pairs, [("Mac", 1), ("iOS", 2)]);

  let locations = s
    .count_by_dimension(&EventType::PageView, Dimension::Location, since)
    .await
    .unwrap();
  assert_eq!(locations.len(), 1);
  assert_eq!(locations[0].label, "Canada");
}

// ─── Summary snapshot ────────────────────────────────────────────────────────

fn snapshot(views: &str) -> SummarySnapshot {
  SummarySnapshot {
    views:        MetricCard::new(views, "+11.01%", Direction::Increase),
    visits:       MetricCard::new("367K", "-0.03%", Direction::Decrease),
    new_users:    MetricCard::new("1,156", "+15.03%", Direction::Increase),
    active_users: MetricCard::new("239K", "+6.08%", Direction::Increase),
  }
}

#[tokio::test]
async fn summary_absent_until_written() {
  let s = store().await;
  assert!(s.summary().await.unwrap().is_none());
}

#[tokio::test]
async fn replace_summary_keeps_a_single_row() {
  let s = store().await;
  s.replace_summary(snapshot("721K")).await.unwrap();
  assert_eq!(s.summary().await.unwrap(), Some(snapshot("721K")));

  s.replace_summary(snapshot("800K")).await.unwrap();
  assert_eq!(s.summary().await.unwrap(), Some(snapshot("800K")));
}

// ─── Aggregation engine over SQLite ──────────────────────────────────────────

fn analytics(s: &SqliteStore, now: DateTime<Utc>) -> Analytics<SqliteStore> {
  Analytics::new(Arc::new(s.clone()), Arc::new(ManualClock::new(now)))
}

#[tokio::test]
async fn monthly_registrations_two_year_example() {
  let s = store().await;
  s.record_event(NewEvent::new(EventType::NewRegistration, at(2023, 1, 10))).await.unwrap();
  s.record_event(NewEvent::new(EventType::NewRegistration, at(2024, 3, 10))).await.unwrap();
  // Older than last year: ignored.
  s.record_event(NewEvent::new(EventType::NewRegistration, at(2022, 2, 10))).await.unwrap();

  let series = analytics(&s, at(2024, 7, 1)).monthly_registrations().await.unwrap();
  assert_eq!(series, vec![
    MonthlyRegistrations { month: "Jan", this_year: 0, last_year: 1 },
    MonthlyRegistrations { month: "Mar", this_year: 1, last_year: 0 },
  ]);
}

#[tokio::test]
async fn device_breakdown_ranks_with_alphabetical_ties() {
  let s = store().await;
  let now = at(2024, 6, 30);
  for device in ["Windows", "Windows", "Mac", "Linux", "Windows", "Linux", "Mac"] {
    s.record_event(NewEvent::new(EventType::PageView, now - Duration::days(1)).device(device))
      .await
      .unwrap();
  }
  s.record_event(NewEvent::new(EventType::PageView, now - Duration::days(31)).device("Android"))
    .await
    .unwrap();

  let engine = analytics(&s, now);
  let devices = engine.device_breakdown().await.unwrap();
  assert_eq!(devices, vec![
    DeviceTraffic { device: "Windows".into(), traffic: 3 },
    DeviceTraffic { device: "Linux".into(), traffic: 2 },
    DeviceTraffic { device: "Mac".into(), traffic: 2 },
  ]);

  // Idempotent: a second run over the same data yields the same view.
  assert_eq!(engine.device_breakdown().await.unwrap(), devices);
}

#[tokio::test]
async fn location_breakdown_percentages() {
  let s = store().await;
  let now = at(2024, 6, 30);
  for location in ["United States", "United States", "Canada", "Mexico"] {
    s.record_event(NewEvent::new(EventType::PageView, now).location(location))
      .await
      .unwrap();
  }

  let rows = analytics(&s, now).location_breakdown().await.unwrap();
  let view: Vec<_> = rows
    .iter()
    .map(|r| (r.name.as_str(), r.value, r.percentage.as_str()))
    .collect();
  assert_eq!(view, [
    ("United States", 2, "50.0%"),
    ("Canada", 1, "25.0%"),
    ("Mexico", 1, "25.0%"),
  ]);
}

#[tokio::test]
async fn location_breakdown_empty_window() {
  let s = store().await;
  let now = at(2024, 6, 30);
  s.record_event(NewEvent::new(EventType::PageView, now - Duration::days(45)).location("Canada"))
    .await
    .unwrap();

  assert!(analytics(&s, now).location_breakdown().await.unwrap().is_empty());
}
