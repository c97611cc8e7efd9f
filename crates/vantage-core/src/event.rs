//! Events: the immutable facts the analytics views are computed from.
//!
//! Events are written by instrumentation and never updated. The aggregation
//! engine only ever reads them.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Event type ──────────────────────────────────────────────────────────────

/// The kind of thing that happened. The set is open: unknown discriminants are
/// preserved verbatim in [`EventType::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventType {
  PageView,
  UserLogin,
  NewRegistration,
  Other(String),
}

impl EventType {
  pub fn as_str(&self) -> &str {
    match self {
      Self::PageView => "page_view",
      Self::UserLogin => "user_login",
      Self::NewRegistration => "new_registration",
      Self::Other(s) => s,
    }
  }
}

impl From<&str> for EventType {
  fn from(s: &str) -> Self {
    match s {
      "page_view" => Self::PageView,
      "user_login" => Self::UserLogin,
      "new_registration" => Self::NewRegistration,
      other => Self::Other(other.to_owned()),
    }
  }
}

impl From<String> for EventType {
  fn from(s: String) -> Self { Self::from(s.as_str()) }
}

impl From<EventType> for String {
  fn from(t: EventType) -> Self { t.as_str().to_owned() }
}

impl fmt::Display for EventType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

// ─── Event ───────────────────────────────────────────────────────────────────

/// A persisted event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
  pub event_id:    Uuid,
  /// When the event happened (UTC).
  pub occurred_at: DateTime<Utc>,
  pub event_type:  EventType,
  /// Weak reference; the user may no longer exist.
  pub user_id:     Option<Uuid>,
  pub device:      Option<String>,
  pub location:    Option<String>,
  pub value:       f64,
}

/// Input for [`DashboardStore::record_event`](crate::store::DashboardStore::record_event).
#[derive(Debug, Clone, PartialEq)]
pub struct NewEvent {
  pub occurred_at: DateTime<Utc>,
  pub event_type:  EventType,
  pub user_id:     Option<Uuid>,
  pub device:      Option<String>,
  pub location:    Option<String>,
  pub value:       f64,
}

impl NewEvent {
  /// Convenience constructor with all optional fields unset and `value = 1.0`.
  pub fn new(event_type: EventType, occurred_at: DateTime<Utc>) -> Self {
    Self {
      occurred_at,
      event_type,
      user_id: None,
      device: None,
      location: None,
      value: 1.0,
    }
  }

  pub fn device(mut self, device: impl Into<String>) -> Self {
    self.device = Some(device.into());
    self
  }

  pub fn location(mut self, location: impl Into<String>) -> Self {
    self.location = Some(location.into());
    self
  }

  pub fn user(mut self, user_id: Uuid) -> Self {
    self.user_id = Some(user_id);
    self
  }
}

// ─── Grouped counts ──────────────────────────────────────────────────────────

/// A categorical column events can be grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
  Device,
  Location,
}

/// Number of events in one calendar month (`1..=12`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthCount {
  pub month: u32,
  pub count: u64,
}

/// Number of events sharing one value of a [`Dimension`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelCount {
  pub label: String,
  pub count: u64,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn event_type_roundtrips_known_and_unknown() {
    for s in ["page_view", "user_login", "new_registration", "checkout"] {
      assert_eq!(EventType::from(s).as_str(), s);
    }
    assert_eq!(EventType::from("page_view"), EventType::PageView);
    assert_eq!(EventType::from("checkout"), EventType::Other("checkout".into()));
  }

  #[test]
  fn event_type_serialises_as_plain_string() {
    let json = serde_json::to_string(&EventType::NewRegistration).unwrap();
    assert_eq!(json, "\"new_registration\"");
    let back: EventType = serde_json::from_str("\"user_login\"").unwrap();
    assert_eq!(back, EventType::UserLogin);
  }

  #[test]
  fn new_event_defaults_value_to_one() {
    let e = NewEvent::new(EventType::PageView, Utc::now()).device("iOS");
    assert_eq!(e.value, 1.0);
    assert_eq!(e.device.as_deref(), Some("iOS"));
    assert!(e.location.is_none());
  }
}
