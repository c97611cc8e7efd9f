//! Protected chart and summary endpoints.

use axum::{Json, extract::State};
use vantage_core::{
  analytics::{DeviceTraffic, LocationTraffic, MonthlyRegistrations},
  store::DashboardStore,
  summary::SummarySnapshot,
};

use crate::{
  AppState,
  envelope::Envelope,
  error::{ApiError, ApiResult},
};

/// `GET /api/dashboard/summary`
#[utoipa::path(
  get,
  path = "/api/dashboard/summary",
  tag = "Dashboard",
  summary = "Summary cards",
  security(("bearer_auth" = [])),
  responses(
    (status = 200, description = "OK", body = Envelope<SummarySnapshot>),
    (status = 401, description = "Missing, invalid or expired token"),
    (status = 404, description = "No summary data found"),
  )
)]
pub async fn summary<S: DashboardStore + 'static>(
  State(state): State<AppState<S>>,
) -> ApiResult<Json<Envelope<SummarySnapshot>>> {
  let snapshot = state
    .analytics
    .summary()
    .await
    .map_err(ApiError::store)?
    .ok_or(ApiError::NotFound("No summary data found"))?;

  Ok(Envelope::success(snapshot, "Summary data fetched successfully."))
}

/// `GET /api/dashboard/total-users`
#[utoipa::path(
  get,
  path = "/api/dashboard/total-users",
  tag = "Dashboard",
  summary = "Registrations per month, this year against last year",
  security(("bearer_auth" = [])),
  responses(
    (status = 200, description = "OK", body = Envelope<Vec<MonthlyRegistrations>>),
    (status = 401, description = "Missing, invalid or expired token"),
  )
)]
pub async fn total_users<S: DashboardStore + 'static>(
  State(state): State<AppState<S>>,
) -> ApiResult<Json<Envelope<Vec<MonthlyRegistrations>>>> {
  let series = state.analytics.monthly_registrations().await.map_err(ApiError::store)?;
  Ok(Envelope::success(series, "Total users chart data fetched."))
}

/// `GET /api/dashboard/traffic-by-device`
#[utoipa::path(
  get,
  path = "/api/dashboard/traffic-by-device",
  tag = "Dashboard",
  summary = "Page views per device over the last 30 days",
  security(("bearer_auth" = [])),
  responses(
    (status = 200, description = "OK", body = Envelope<Vec<DeviceTraffic>>),
    (status = 401, description = "Missing, invalid or expired token"),
  )
)]
pub async fn traffic_by_device<S: DashboardStore + 'static>(
  State(state): State<AppState<S>>,
) -> ApiResult<Json<Envelope<Vec<DeviceTraffic>>>> {
  let rows = state.analytics.device_breakdown().await.map_err(ApiError::store)?;
  Ok(Envelope::success(rows, "Traffic by device fetched."))
}

/// `GET /api/dashboard/traffic-by-location`
#[utoipa::path(
  get,
  path = "/api/dashboard/traffic-by-location",
  tag = "Dashboard",
  summary = "Page views and share per location over the last 30 days",
  security(("bearer_auth" = [])),
  responses(
    (status = 200, description = "OK", body = Envelope<Vec<LocationTraffic>>),
    (status = 401, description = "Missing, invalid or expired token"),
  )
)]
pub async fn traffic_by_location<S: DashboardStore + 'static>(
  State(state): State<AppState<S>>,
) -> ApiResult<Json<Envelope<Vec<LocationTraffic>>>> {
  let rows = state.analytics.location_breakdown().await.map_err(ApiError::store)?;
  Ok(Envelope::success(rows, "Traffic by location fetched."))
}
