//! `music-link-generator` function

use axum::{body::Bytes, routing::post, Json, Router};
use encore_common::catalog::{MusicLinkRequest, MusicLinks};

use super::{parse_body, preflight};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// POST /music-link-generator
///
/// Missing fields answer 500 like any other failure of this function.
pub async fn generate_links(body: Bytes) -> ApiResult<Json<MusicLinks>> {
    let request: MusicLinkRequest = parse_body(&body)?;

    let present = |value: Option<String>| value.filter(|v| !v.trim().is_empty());
    match (present(request.song_name), present(request.artist_name)) {
        (Some(song), Some(artist)) => Ok(Json(MusicLinks::for_song(&song, &artist))),
        _ => Err(ApiError::Internal(
            "Song name and artist name are required.".to_string(),
        )),
    }
}

pub fn music_link_routes() -> Router<AppState> {
    Router::new().route("/music-link-generator", post(generate_links).options(preflight))
}
