use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("failed to retrieve content: {0}")]
    FetchFailed(String),
    #[error("failed to search Wikipedia: {0}")]
    SearchFailed(String),
    #[error("{0}")]
    NotFound(String),
    #[error("session store unreadable: {0}")]
    StoreCorrupt(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn internal<E: std::fmt::Display>(err: E) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl IntoResponse for ApiError {
    // Failures surface in the body with a success status; clients inspect
    // the payload for an `error` key rather than the status code.
    fn into_response(self) -> axum::response::Response {
        let body = Json(json!({ "error": self.to_string() }));
        (StatusCode::OK, body).into_response()
    }
}
