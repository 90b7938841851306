//! encore-proxy library interface
//!
//! Hosts the two catalog functions the client calls: `spotify-search` and
//! `music-link-generator`. Routes are served at the root and again under
//! `/functions/v1` so the client's functions URL can point at either a
//! hosted backend or this service directly.

pub mod api;
pub mod config;
pub mod error;
pub mod spotify;

pub use crate::error::{ApiError, ApiResult};
pub use crate::spotify::{CatalogSearch, SpotifyClient, SpotifyCredentials};

use std::sync::Arc;

use axum::http::{header, HeaderValue};
use axum::Router;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

/// Mount point used by hosted backends
pub const FUNCTIONS_PREFIX: &str = "/functions/v1";

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<dyn CatalogSearch>,
}

impl AppState {
    pub fn new(catalog: Arc<dyn CatalogSearch>) -> Self {
        Self { catalog }
    }
}

fn function_routes() -> Router<AppState> {
    Router::new()
        .merge(api::search_routes())
        .merge(api::music_link_routes())
}

/// Headers browser callers may send
pub const ALLOWED_HEADERS: &str = "authorization, x-client-info, apikey, content-type";

/// Build application router
///
/// CORS headers go on every response, errors and OPTIONS included. OPTIONS
/// is routed to the functions themselves, which answer `ok`.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(function_routes())
        .nest(FUNCTIONS_PREFIX, function_routes())
        .merge(api::health_routes())
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOWED_HEADERS),
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
