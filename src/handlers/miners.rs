//! Miner CRUD handlers: list, read, create, update, delete.

use super::parse_id;
use crate::error::AppError;
use crate::response::created;
use crate::service::RequestValidator;
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::Value;

/// GET /miners, each with its gems under `rare_gems`.
pub async fn list(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let miners = state.store.list_miners().await?;
    Ok(Json(miners))
}

/// GET /miners/:id
pub async fn read(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id_str)?;
    let miner = state.store.find_miner(id).await?;
    Ok(Json(miner))
}

/// POST /miners
pub async fn create(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(body) = body?;
    let changes = RequestValidator::miner_changes(body)?;
    let miner = state.store.create_miner(&changes).await?;
    tracing::info!(id = miner.id, "miner created");
    Ok(created(miner.location(), miner))
}

/// PATCH or PUT /miners/:id; absent fields stay as they are.
pub async fn update(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id_str)?;
    let Json(body) = body?;
    let changes = RequestValidator::miner_changes(body)?;
    let miner = state.store.update_miner(id, &changes).await?;
    Ok(Json(miner))
}

/// DELETE /miners/:id
pub async fn delete(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id_str)?;
    state.store.delete_miner(id).await?;
    tracing::info!(id, "miner deleted");
    Ok(StatusCode::NO_CONTENT)
}
