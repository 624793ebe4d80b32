use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::{json, Value};

use super::require_param;
use crate::core::errors::ApiError;
use crate::state::AppState;

pub async fn list_folders(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let folders = state.store.list_folders()?;
    let result: Vec<Value> = folders
        .into_iter()
        .map(|folder| {
            json!({
                "id": folder.id,
                "name": folder.name,
                "created_at": folder.created_at,
            })
        })
        .collect();
    Ok(Json(json!({"folders": result})))
}

pub async fn create_folder(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, ApiError> {
    let name = require_param(&params, "name")?;
    let folder = state.store.create_folder(name)?;
    Ok(Json(json!({"folder_id": folder.id, "name": folder.name})))
}

pub async fn delete_folder(
    State(state): State<Arc<AppState>>,
    Path(folder_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.store.delete_folder(&folder_id)?;
    Ok(Json(json!({"message": "Folder deleted"})))
}
