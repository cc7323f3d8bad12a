//! Rare gem CRUD handlers. Create and update go through the miner reference check.

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

/// GET /rare_gems
pub async fn list(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let gems = state.store.list_rare_gems().await?;
    Ok(Json(gems))
}

/// GET /rare_gems/:id
pub async fn read(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id_str)?;
    let gem = state.store.find_rare_gem(id).await?;
    Ok(Json(gem))
}

/// POST /rare_gems; `miner_id` is required.
pub async fn create(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(body) = body?;
    let changes = RequestValidator::rare_gem_changes(body, true)?;
    let gem = state.store.create_rare_gem(&changes).await?;
    tracing::info!(id = gem.id, miner_id = gem.miner_id, "rare gem created");
    Ok(created(gem.location(), gem))
}

/// PATCH or PUT /rare_gems/:id
pub async fn update(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id_str)?;
    let Json(body) = body?;
    let changes = RequestValidator::rare_gem_changes(body, false)?;
    let gem = state.store.update_rare_gem(id, &changes).await?;
    Ok(Json(gem))
}

/// DELETE /rare_gems/:id
pub async fn delete(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id_str)?;
    state.store.delete_rare_gem(id).await?;
    tracing::info!(id, "rare gem deleted");
    Ok(StatusCode::NO_CONTENT)
}
