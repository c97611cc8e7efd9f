//! The aggregation engine: chart-ready views derived from the event log.
//!
//! Nothing here is persisted. Every view is recomputed from grouped counts on
//! each call, so all operations are read-only and safe to run concurrently.

use std::sync::Arc;

use chrono::{DateTime, Datelike as _, Duration, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
  clock::Clock,
  event::{Dimension, EventType, LabelCount, MonthCount},
  store::DashboardStore,
  summary::SummarySnapshot,
};

/// Length of the trailing window used by the traffic breakdowns.
pub const TRAFFIC_WINDOW_DAYS: i64 = 30;

pub const MONTH_ABBREVIATIONS: [&str; 12] = [
  "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

// ─── View types ──────────────────────────────────────────────────────────────

/// One point of the registrations chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct MonthlyRegistrations {
  #[schema(example = "Jan")]
  pub month:     &'static str,
  #[serde(rename = "This year")]
  pub this_year: u64,
  #[serde(rename = "Last year")]
  pub last_year: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct DeviceTraffic {
  pub device:  String,
  pub traffic: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct LocationTraffic {
  pub name:       String,
  pub value:      u64,
  /// Share of the window's total, e.g. `"42.3%"`.
  #[schema(example = "42.3%")]
  pub percentage: String,
}

// ─── Engine ──────────────────────────────────────────────────────────────────

/// Read-only analytics over a [`DashboardStore`].
pub struct Analytics<S> {
  store: Arc<S>,
  clock: Arc<dyn Clock>,
}

impl<S> Clone for Analytics<S> {
  fn clone(&self) -> Self {
    Self { store: Arc::clone(&self.store), clock: Arc::clone(&self.clock) }
  }
}

impl<S: DashboardStore> Analytics<S> {
  pub fn new(store: Arc<S>, clock: Arc<dyn Clock>) -> Self { Self { store, clock } }

  /// The externally maintained snapshot, verbatim.
  pub async fn summary(&self) -> Result<Option<SummarySnapshot>, S::Error> {
    self.store.summary().await
  }

  /// Registrations per month for the current and the previous calendar year.
  pub async fn monthly_registrations(&self) -> Result<Vec<MonthlyRegistrations>, S::Error> {
    let year = self.clock.now().year();
    let this_year = self
      .store
      .count_by_month(&EventType::NewRegistration, year)
      .await?;
    let last_year = self
      .store
      .count_by_month(&EventType::NewRegistration, year - 1)
      .await?;
    Ok(merge_monthly(&this_year, &last_year))
  }

  /// Page views per device over the trailing window, busiest first.
  pub async fn device_breakdown(&self) -> Result<Vec<DeviceTraffic>, S::Error> {
    let counts = self.trailing_page_views(Dimension::Device).await?;
    Ok(
      rank(counts)
        .into_iter()
        .map(|c| DeviceTraffic { device: c.label, traffic: c.count })
        .collect(),
    )
  }

  /// Page views per location over the trailing window, busiest first, with
  /// each location's share of the total.
  pub async fn location_breakdown(&self) -> Result<Vec<LocationTraffic>, S::Error> {
    let counts = self.trailing_page_views(Dimension::Location).await?;
    Ok(with_percentages(rank(counts)))
  }

  async fn trailing_page_views(&self, dimension: Dimension) -> Result<Vec<LabelCount>, S::Error> {
    let since = window_start(self.clock.now());
    self
      .store
      .count_by_dimension(&EventType::PageView, dimension, since)
      .await
  }
}

// ─── Pure helpers ────────────────────────────────────────────────────────────

/// Inclusive lower bound of the traffic window ending at `now`.
pub fn window_start(now: DateTime<Utc>) -> DateTime<Utc> {
  now - Duration::days(TRAFFIC_WINDOW_DAYS)
}

/// Zip two per-month count lists into calendar order, dropping months that
/// are zero in both years.
pub fn merge_monthly(this_year: &[MonthCount], last_year: &[MonthCount]) -> Vec<MonthlyRegistrations> {
  let count_for = |counts: &[MonthCount], month: u32| {
    counts
      .iter()
      .filter(|c| c.month == month)
      .map(|c| c.count)
      .sum::<u64>()
  };

  (1..=12u32)
    .zip(MONTH_ABBREVIATIONS)
    .map(|(month, abbr)| MonthlyRegistrations {
      month:     abbr,
      this_year: count_for(this_year, month),
      last_year: count_for(last_year, month),
    })
    .filter(|m| m.this_year > 0 || m.last_year > 0)
    .collect()
}

/// Order by count descending; equal counts are ordered alphabetically by
/// label so the output is deterministic.
pub fn rank(mut counts: Vec<LabelCount>) -> Vec<LabelCount> {
  counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
  counts
}

/// Attach a one-decimal percentage of the total to every row. A zero total
/// yields `0.0%` everywhere.
pub fn with_percentages(counts: Vec<LabelCount>) -> Vec<LocationTraffic> {
  let total: u64 = counts.iter().map(|c| c.count).sum();
  counts
    .into_iter()
    .map(|c| LocationTraffic {
      percentage: format_percentage(c.count, total),
      name:       c.label,
      value:      c.count,
    })
    .collect()
}

fn format_percentage(count: u64, total: u64) -> String {
  let share = if total > 0 { count as f64 / total as f64 * 100.0 } else { 0.0 };
  format!("{share:.1}%")
}
