//! The summary snapshot shown on the dashboard cards.
//!
//! Values are maintained by an external process and served verbatim.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::Error;

/// Whether a metric went up or down since the previous period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
  Increase,
  Decrease,
}

impl Direction {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Increase => "increase",
      Self::Decrease => "decrease",
    }
  }
}

impl FromStr for Direction {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "increase" => Ok(Self::Increase),
      "decrease" => Ok(Self::Decrease),
      other => Err(Error::UnknownDirection(other.to_owned())),
    }
  }
}

/// One summary card: display value, change magnitude and direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct MetricCard {
  pub value:     String,
  pub change:    String,
  #[serde(rename = "type")]
  pub direction: Direction,
}

impl MetricCard {
  pub fn new(value: impl Into<String>, change: impl Into<String>, direction: Direction) -> Self {
    Self { value: value.into(), change: change.into(), direction }
  }
}

/// The single current-state row. Replaced wholesale, never patched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SummarySnapshot {
  pub views:        MetricCard,
  pub visits:       MetricCard,
  pub new_users:    MetricCard,
  pub active_users: MetricCard,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn direction_parses_known_tags_only() {
    assert_eq!("increase".parse::<Direction>().unwrap(), Direction::Increase);
    assert_eq!("decrease".parse::<Direction>().unwrap(), Direction::Decrease);
    assert!(matches!(
      "sideways".parse::<Direction>(),
      Err(Error::UnknownDirection(s)) if s == "sideways"
    ));
  }

  #[test]
  fn snapshot_serialises_with_dashboard_keys() {
    let snapshot = SummarySnapshot {
      views:        MetricCard::new("721K", "+11.01%", Direction::Increase),
      visits:       MetricCard::new("367K", "-0.03%", Direction::Decrease),
      new_users:    MetricCard::new("1,156", "+15.03%", Direction::Increase),
      active_users: MetricCard::new("239K", "+6.08%", Direction::Increase),
    };
    let json = serde_json::to_value(&snapshot).unwrap();
    assert_eq!(json["views"]["value"], "721K");
    assert_eq!(json["visits"]["type"], "decrease");
    assert_eq!(json["newUsers"]["change"], "+15.03%");
    assert_eq!(json["activeUsers"]["type"], "increase");
  }
}
