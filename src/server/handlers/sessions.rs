use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::{json, Value};

use super::{optional_param, require_param};
use crate::core::errors::ApiError;
use crate::state::AppState;
use crate::store::Message;

pub async fn list_sessions(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let sessions = state.store.list_sessions()?;
    let result: Vec<Value> = sessions
        .into_iter()
        .map(|session| {
            json!({
                "id": session.id,
                "title": session.title,
                "folder_id": session.folder_id,
                "created_at": session.created_at,
            })
        })
        .collect();
    Ok(Json(json!({"sessions": result})))
}

pub async fn create_session(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, ApiError> {
    let title = require_param(&params, "title")?;
    let folder_id = optional_param(&params, "folder_id");

    let session = state.store.create_session(title, folder_id)?;
    Ok(Json(json!({"session_id": session.id, "title": session.title})))
}

pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state.store.get_session(&session_id)?;
    Ok(Json(json!({"session": session})))
}

pub async fn replace_messages(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    Json(messages): Json<Vec<Message>>,
) -> Result<impl IntoResponse, ApiError> {
    state.store.replace_messages(&session_id, messages)?;
    Ok(Json(json!({"message": "Messages updated"})))
}

pub async fn rename_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, ApiError> {
    let title = require_param(&params, "title")?;
    state.store.rename_session(&session_id, title)?;
    Ok(Json(json!({"message": "Title updated"})))
}

pub async fn move_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, ApiError> {
    let folder_id = optional_param(&params, "folder_id");
    state.store.move_session(&session_id, folder_id)?;
    Ok(Json(json!({"message": "Folder updated"})))
}

pub async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.store.delete_session(&session_id)?;
    Ok(Json(json!({"message": "Session deleted"})))
}
