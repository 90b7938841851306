//! HTTP handlers for the catalog proxy functions

pub mod health;
pub mod music_links;
pub mod spotify_search;

pub use health::health_routes;
pub use music_links::music_link_routes;
pub use spotify_search::search_routes;

use axum::body::Bytes;
use serde::de::DeserializeOwned;

use crate::error::{ApiError, ApiResult};

/// OPTIONS on a function route
pub async fn preflight() -> &'static str {
    "ok"
}

/// Decode a JSON body; malformed bodies are server errors
pub(crate) fn parse_body<T: DeserializeOwned>(body: &Bytes) -> ApiResult<T> {
    serde_json::from_slice(body).map_err(|e| ApiError::Internal(format!("Invalid request body: {}", e)))
}
