//! Liveness endpoint.
//!
//! Unlike the data routes this one never surfaces a store error body: a
//! failing store turns into `503` with `"status": "unavailable"` so
//! supervisors can tell "process up, database down" apart.

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;
use tracing::warn;

use super::AppState;

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    tanks: Option<usize>,
}

/// Handle `GET /health` by listing tanks as a cheap store round trip.
async fn health(State(store): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    // ---
    match store.list_tanks().await {
        Ok(tanks) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "healthy",
                tanks: Some(tanks.len()),
            }),
        ),
        Err(e) => {
            warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "unavailable",
                    tanks: None,
                }),
            )
        }
    }
}

/// Create the subrouter containing `/health`.
///
/// # Returns
/// A [`Router<AppState>`] with a single GET `/health` route.
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}
