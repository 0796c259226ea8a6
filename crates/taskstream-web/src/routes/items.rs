//! Item route handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use taskstream_core::item::model::Item;
use taskstream_core::TaskError;
use taskstream_db::ItemFilter;

use crate::state::AppState;

#[derive(Deserialize)]
pub struct CreateItemRequest {
    pub text: String,
}

#[derive(Serialize)]
pub struct ClearResponse {
    pub deleted: u64,
}

fn reject(e: TaskError) -> (StatusCode, String) {
    let status = match e {
        TaskError::ItemNotFound(_) => StatusCode::NOT_FOUND,
        TaskError::ValidationError(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, e.to_string())
}

pub async fn list_all(
    State(state): State<AppState>,
) -> Result<Json<Vec<Item>>, (StatusCode, String)> {
    let items = taskstream_core::item::list_items(&state.db, ItemFilter::All)
        .await
        .map_err(reject)?;
    Ok(Json(items))
}

pub async fn list_active(
    State(state): State<AppState>,
) -> Result<Json<Vec<Item>>, (StatusCode, String)> {
    let items = taskstream_core::item::list_items(&state.db, ItemFilter::Active)
        .await
        .map_err(reject)?;
    Ok(Json(items))
}

pub async fn list_completed(
    State(state): State<AppState>,
) -> Result<Json<Vec<Item>>, (StatusCode, String)> {
    let items = taskstream_core::item::list_items(&state.db, ItemFilter::Completed)
        .await
        .map_err(reject)?;
    Ok(Json(items))
}

pub async fn create_item(
    State(state): State<AppState>,
    Json(req): Json<CreateItemRequest>,
) -> Result<(StatusCode, Json<Item>), (StatusCode, String)> {
    let item = taskstream_core::item::create_item(&state.db, &req.text)
        .await
        .map_err(reject)?;
    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn toggle_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Item>, (StatusCode, String)> {
    let item = taskstream_core::item::toggle_item(&state.db, &id)
        .await
        .map_err(reject)?;
    Ok(Json(item))
}

pub async fn delete_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, (StatusCode, String)> {
    taskstream_core::item::delete_item(&state.db, &id)
        .await
        .map_err(reject)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn clear_completed(
    State(state): State<AppState>,
) -> Result<Json<ClearResponse>, (StatusCode, String)> {
    let deleted = taskstream_core::item::clear_completed(&state.db)
        .await
        .map_err(reject)?;
    Ok(Json(ClearResponse { deleted }))
}
