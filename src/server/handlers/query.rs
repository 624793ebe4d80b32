use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use super::require_param;
use crate::core::errors::ApiError;
use crate::retrieval::chunker;
use crate::state::AppState;

/// `GET /query?url=&query=`: fetch the page, chunk it, and return the
/// chunks most relevant to the query.
pub async fn query_wiki(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, ApiError> {
    let url = require_param(&params, "url")?;
    let query = require_param(&params, "query")?;

    let text = state.fetcher.fetch_text(url).await?;

    let retrieval = &state.settings.retrieval;
    let chunks = chunker::split_into_chunks(&text, retrieval.chunk_size, retrieval.chunk_overlap)?;
    let relevant_chunks = state
        .retriever
        .rank(&chunks, query, retrieval.top_k)
        .await?;

    Ok(Json(json!({"relevant_chunks": relevant_chunks})))
}

/// `GET /explore?query=&language=`: search Wikipedia for candidate pages.
pub async fn explore(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, ApiError> {
    let query = require_param(&params, "query")?;
    let language = params.get("language").map(String::as_str);

    let page_urls = state.search.search(query, language).await?;

    Ok(Json(json!({"page_urls": page_urls})))
}
