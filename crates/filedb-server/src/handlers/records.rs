//! Record CRUD handlers.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::Value;

use filedb_core::{Record, RecordId};

use crate::error::ApiError;
use crate::state::AppState;

/// Decodes a request body into a record the caller may submit.
///
/// The body must be a JSON object without the reserved `id` field.
fn parse_record(body: &[u8]) -> Result<Record, ApiError> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|_| ApiError::BadRequest("Error decoding JSON".to_string()))?;
    let record = Record::try_from(value)
        .map_err(|_| ApiError::BadRequest("Error decoding JSON".to_string()))?;
    record.ensure_unreserved()?;
    Ok(record)
}

fn parse_id(raw: &str) -> Result<RecordId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::BadRequest("Invalid ID".to_string()))
}

/// Creates a record and returns it with its assigned id.
///
/// `POST /records`
pub async fn create_record(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Record>, ApiError> {
    let data = parse_record(&body)?;
    let record = state.store.create(data)?;
    Ok(Json(record))
}

/// Fetches a record by id.
///
/// `GET /records/{id}`
pub async fn get_record(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Record>, ApiError> {
    let id = parse_id(&id)?;
    let record = state.store.read(id)?;
    Ok(Json(record))
}

/// Replaces a record by id.
///
/// `PUT /records/{id}`
pub async fn update_record(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<Record>, ApiError> {
    let id = parse_id(&id)?;
    let data = parse_record(&body)?;
    let record = state.store.update(id, data)?;
    Ok(Json(record))
}

/// Deletes a record by id.
///
/// `DELETE /records/{id}`
pub async fn delete_record(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;
    state.store.delete(id)?;
    Ok(StatusCode::NO_CONTENT)
}
