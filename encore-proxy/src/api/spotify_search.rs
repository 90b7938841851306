//! `spotify-search` function
//!
//! Forwards a query to the catalog provider and returns its response
//! unchanged (`tracks` / `artists` pages).

use axum::{body::Bytes, extract::State, routing::post, Json, Router};
use encore_common::catalog::SearchRequest;
use serde_json::Value;
use tracing::info;

use super::{parse_body, preflight};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// POST /spotify-search
pub async fn spotify_search(State(state): State<AppState>, body: Bytes) -> ApiResult<Json<Value>> {
    let request: SearchRequest = parse_body(&body)?;

    let query = request
        .query
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Search query is missing".to_string()))?;
    let kind = request.kind.unwrap_or_default();

    info!(query, kind = kind.as_str(), "Catalog search");
    let results = state.catalog.search(query, kind).await?;
    Ok(Json(results))
}

pub fn search_routes() -> Router<AppState> {
    Router::new().route("/spotify-search", post(spotify_search).options(preflight))
}
