//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as fixed-width RFC 3339 UTC strings. UUIDs are
//! stored as hyphenated lowercase strings.

use chrono::{DateTime, SecondsFormat, TimeZone as _, Utc};
use vantage_core::{
  event::Dimension,
  summary::{Direction, MetricCard, SummarySnapshot},
  user::User,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

/// Encoded midnight of January 1st of `year`.
pub fn encode_year_start(year: i32) -> Result<String> {
  Utc
    .with_ymd_and_hms(year, 1, 1, 0, 0, 0)
    .single()
    .map(encode_dt)
    .ok_or_else(|| Error::DateParse(format!("year out of range: {year}")))
}

// ─── Dimension ────────────────────────────────────────────────────────────────

/// Column name for a grouping dimension. Only ever interpolated from this
/// fixed set.
pub fn dimension_column(d: Dimension) -> &'static str {
  match d {
    Dimension::Device => "device",
    Dimension::Location => "location",
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

pub const USER_COLUMNS: &str =
  "user_id, name, email, password_hash, federated_id, created_at";

/// Raw strings read directly from a `users` row.
pub struct RawUser {
  pub user_id:       String,
  pub name:          String,
  pub email:         String,
  pub password_hash: Option<String>,
  pub federated_id:  Option<String>,
  pub created_at:    String,
}

impl RawUser {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:       row.get(0)?,
      name:          row.get(1)?,
      email:         row.get(2)?,
      password_hash: row.get(3)?,
      federated_id:  row.get(4)?,
      created_at:    row.get(5)?,
    })
  }

  pub fn into_user(self) -> Result<User> {
    let user = User {
      user_id:       decode_uuid(&self.user_id)?,
      name:          self.name,
      email:         self.email,
      password_hash: self.password_hash,
      federated_id:  self.federated_id,
      created_at:    decode_dt(&self.created_at)?,
    };
    user.check_credentials()?;
    Ok(user)
  }
}

/// Column values for an `events` row.
pub struct RawEvent {
  pub event_id:    String,
  pub occurred_at: String,
  pub event_type:  String,
  pub user_id:     Option<String>,
  pub device:      Option<String>,
  pub location:    Option<String>,
  pub value:       f64,
}

pub const SUMMARY_COLUMNS: &str = "views, views_change, views_type,
  visits, visits_change, visits_type,
  new_users, new_users_change, new_users_type,
  active_users, active_users_change, active_users_type";

/// The twelve text columns of the `summary_snapshot` row, in
/// [`SUMMARY_COLUMNS`] order.
pub struct RawSummary(pub [String; 12]);

impl RawSummary {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    let mut cols: [String; 12] = Default::default();
    for (i, col) in cols.iter_mut().enumerate() {
      *col = row.get(i)?;
    }
    Ok(Self(cols))
  }

  pub fn from_snapshot(s: &SummarySnapshot) -> Self {
    let cells = |m: &MetricCard| [m.value.clone(), m.change.clone(), m.direction.as_str().to_owned()];
    let [a, b, c] = cells(&s.views);
    let [d, e, f] = cells(&s.visits);
    let [g, h, i] = cells(&s.new_users);
    let [j, k, l] = cells(&s.active_users);
    Self([a, b, c, d, e, f, g, h, i, j, k, l])
  }

  pub fn into_snapshot(self) -> Result<SummarySnapshot> {
    let [a, b, c, d, e, f, g, h, i, j, k, l] = self.0;
    let card = |value: String, change: String, direction: String| -> Result<MetricCard> {
      Ok(MetricCard { value, change, direction: direction.parse::<Direction>()? })
    };
    Ok(SummarySnapshot {
      views:        card(a, b, c)?,
      visits:       card(d, e, f)?,
      new_users:    card(g, h, i)?,
      active_users: card(j, k, l)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn timestamps_are_fixed_width_and_roundtrip() {
    let dt = Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap();
    let s = encode_dt(dt);
    assert_eq!(s, "2024-03-01T09:30:00.000000Z");
    assert_eq!(decode_dt(&s).unwrap(), dt);
  }

  #[test]
  fn year_start_matches_encoding() {
    assert_eq!(encode_year_start(2023).unwrap(), "2023-01-01T00:00:00.000000Z");
  }

  #[test]
  fn unknown_direction_is_rejected() {
    let mut raw = RawSummary::from_snapshot(&SummarySnapshot {
      views:        MetricCard::new("1", "1%", Direction::Increase),
      visits:       MetricCard::new("1", "1%", Direction::Increase),
      new_users:    MetricCard::new("1", "1%", Direction::Increase),
      active_users: MetricCard::new("1", "1%", Direction::Decrease),
    });
    raw.0[2] = "flat".into();
    assert!(matches!(
      raw.into_snapshot(),
      Err(Error::Core(vantage_core::Error::UnknownDirection(_)))
    ));
  }
}
