use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

pub async fn welcome() -> impl IntoResponse {
    Json(json!({"message": "Welcome to the Wiki Assistant API"}))
}
