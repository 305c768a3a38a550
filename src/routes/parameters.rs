//! Parameter ledger endpoints under `/api/parameters`.
//!
//! Records are addressed by `(tank_id, date)`; the date segment is parsed
//! by the store, so a malformed day is a `400` rather than a `404`.

use axum::{
    extract::State,
    response::{IntoResponse, Response},
    routing::{delete, get},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use super::{ApiError, ApiJson, ApiPath, ApiQuery, AppState};
use crate::{ParameterFields, ParameterRecord};

// ---

/// Create the subrouter for the parameter ledger.
///
/// # Returns
/// A [`Router<AppState>`] with:
/// - `GET`/`POST` `/api/parameters`
/// - `DELETE` `/api/parameters/clear`
/// - `GET`/`DELETE` `/api/parameters/{tank_id}/{date}`
pub fn router() -> Router<AppState> {
    // ---
    Router::new()
        .route("/api/parameters", get(list_parameters).post(upsert_parameter))
        .route("/api/parameters/clear", delete(clear_parameters))
        .route(
            "/api/parameters/{tank_id}/{date}",
            get(get_parameter).delete(delete_parameter),
        )
}

/// Optional tank filter shared by listing and clearing.
#[derive(Debug, Deserialize)]
pub struct TankFilter {
    tank_id: Option<i64>,
}

/// Body of `POST /api/parameters`: the key plus every measured field.
#[derive(Debug, Deserialize)]
pub struct UpsertRequest {
    tank_id: i64,
    date: String,
    #[serde(flatten)]
    fields: ParameterFields,
}

/// List one tank's records, or every record with its tank name.
async fn list_parameters(
    State(store): State<AppState>,
    ApiQuery(filter): ApiQuery<TankFilter>,
) -> Result<Response, ApiError> {
    // ---
    debug!("GET /api/parameters - {:?}", filter);
    let response = match filter.tank_id {
        Some(tank_id) => Json(store.list_parameters(tank_id).await?).into_response(),
        None => Json(store.list_all_parameters().await?).into_response(),
    };
    Ok(response)
}

/// Handle `GET /api/parameters/{tank_id}/{date}`; `404` when no record
/// exists at that key.
async fn get_parameter(
    State(store): State<AppState>,
    ApiPath((tank_id, date)): ApiPath<(i64, String)>,
) -> Result<Json<ParameterRecord>, ApiError> {
    Ok(Json(store.get_parameter(tank_id, &date).await?))
}

/// Handle `POST /api/parameters`: insert or fully replace one day's record.
///
/// `tank_id` and `date` are required; a missing one is a `400`. Measured
/// fields left out of the body are stored as null.
async fn upsert_parameter(
    State(store): State<AppState>,
    ApiJson(request): ApiJson<UpsertRequest>,
) -> Result<Json<Value>, ApiError> {
    // ---
    info!("POST /api/parameters - tank {} on {}", request.tank_id, request.date);
    let key = store
        .upsert_parameter(request.tank_id, &request.date, request.fields)
        .await?;

    Ok(Json(json!({
        "success": true,
        "tank_id": key.tank_id,
        "date": key.date,
    })))
}

/// Handle `DELETE /api/parameters/{tank_id}/{date}`.
async fn delete_parameter(
    State(store): State<AppState>,
    ApiPath((tank_id, date)): ApiPath<(i64, String)>,
) -> Result<Json<Value>, ApiError> {
    // ---
    info!("DELETE /api/parameters/{}/{}", tank_id, date);
    store.delete_parameter(tank_id, &date).await?;
    Ok(Json(json!({ "success": true })))
}

/// Without a `tank_id` this wipes the records of every tank.
async fn clear_parameters(
    State(store): State<AppState>,
    ApiQuery(filter): ApiQuery<TankFilter>,
) -> Result<Json<Value>, ApiError> {
    // ---
    info!("DELETE /api/parameters/clear - {:?}", filter);
    let deleted = match filter.tank_id {
        Some(tank_id) => store.clear_parameters(tank_id).await?,
        None => store.clear_all_parameters().await?,
    };
    Ok(Json(json!({ "success": true, "deleted": deleted })))
}
