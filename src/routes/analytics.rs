//! Water-change analytics under `/api/analytics`.

use axum::{
    extract::State,
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::debug;

use super::{ApiError, ApiQuery, AppState};
use crate::analytics::WaterChangeSummary;
use crate::models::parse_calendar_date;
use crate::StoreError;

// ---

/// Create the analytics subrouter.
///
/// # Returns
/// A [`Router<AppState>`] with `GET /api/analytics/water-change-monthly`.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/analytics/water-change-monthly", get(water_change_monthly))
}

#[derive(Debug, Deserialize)]
pub struct WaterChangeQuery {
    tank_id: Option<i64>,
    /// Last day of the rolling window (`YYYY-MM-DD`); defaults to today in UTC.
    as_of: Option<String>,
}

/// Handle `GET /api/analytics/water-change-monthly`.
///
/// Returns the rolling 30-day total and the monthly history for one tank.
/// `tank_id` is required (`400` otherwise); an unknown tank is a `404`.
async fn water_change_monthly(
    State(store): State<AppState>,
    ApiQuery(query): ApiQuery<WaterChangeQuery>,
) -> Result<Json<WaterChangeSummary>, ApiError> {
    // ---
    debug!("GET /api/analytics/water-change-monthly - {:?}", query);

    let tank_id = query
        .tank_id
        .ok_or_else(|| StoreError::Validation("tank_id is required".into()))?;
    let as_of = match query.as_of.as_deref() {
        Some(raw) => parse_calendar_date(raw)?,
        None => Utc::now().date_naive(),
    };

    Ok(Json(store.water_change_summary(tank_id, as_of).await?))
}
