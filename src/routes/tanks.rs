//! Tank registry endpoints under `/api/tanks`.
//!
//! Sibling of the other route modules in the EMBP gateway:
//! - Internal to this file: the CRUD handlers over [`TankRegistry`](crate::TankRegistry)
//! - Exports to the gateway (`mod.rs`): a subrouter with `/api/tanks` and
//!   `/api/tanks/{id}`
//!
//! Bodies and path ids go through [`ApiJson`]/[`ApiPath`], so malformed
//! input is answered with `400 {"error": ...}`.

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde_json::{json, Value};
use tracing::info;

use super::{ApiError, ApiJson, ApiPath, AppState};
use crate::{NewTank, Tank, TankUpdate};

// ---

/// Create the subrouter for tank CRUD.
///
/// # Returns
/// A [`Router<AppState>`] with:
/// - `GET`/`POST` `/api/tanks`
/// - `GET`/`PUT`/`DELETE` `/api/tanks/{id}`
pub fn router() -> Router<AppState> {
    // ---
    Router::new()
        .route("/api/tanks", get(list_tanks).post(create_tank))
        .route(
            "/api/tanks/{id}",
            get(get_tank).put(update_tank).delete(delete_tank),
        )
}

/// Handle `GET /api/tanks`: every tank, ordered by name.
async fn list_tanks(State(store): State<AppState>) -> Result<Json<Vec<Tank>>, ApiError> {
    Ok(Json(store.list_tanks().await?))
}

/// Handle `GET /api/tanks/{id}`; `404` when the id is unknown.
async fn get_tank(
    State(store): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Tank>, ApiError> {
    Ok(Json(store.get_tank(id).await?))
}

/// Handle `POST /api/tanks`.
///
/// Returns `201` with the stored tank, `400` for an empty name, a missing
/// or non-positive `size_gallons`, and `409` when the name is taken.
async fn create_tank(
    State(store): State<AppState>,
    ApiJson(tank): ApiJson<NewTank>,
) -> Result<(StatusCode, Json<Tank>), ApiError> {
    // ---
    info!("POST /api/tanks - '{}'", tank.name);
    let created = store.create_tank(tank).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Handle `PUT /api/tanks/{id}`; fields left out of the body are kept.
async fn update_tank(
    State(store): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(update): ApiJson<TankUpdate>,
) -> Result<Json<Tank>, ApiError> {
    // ---
    info!("PUT /api/tanks/{}", id);
    Ok(Json(store.update_tank(id, update).await?))
}

/// Irreversibly removes the tank and every parameter record it owns.
async fn delete_tank(
    State(store): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Value>, ApiError> {
    // ---
    info!("DELETE /api/tanks/{}", id);
    store.delete_tank(id).await?;
    Ok(Json(json!({ "success": true })))
}
