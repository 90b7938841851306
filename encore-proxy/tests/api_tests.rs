//! Router tests with a scripted catalog

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::response::Response;
use encore_common::catalog::SearchKind;
use encore_proxy::{build_router, ApiError, ApiResult, AppState, CatalogSearch};
use serde_json::{json, Value};
use tower::ServiceExt;

#[derive(Default)]
struct FakeCatalog {
    calls: Mutex<Vec<(String, SearchKind)>>,
    fail_with: Option<String>,
}

#[async_trait]
impl CatalogSearch for FakeCatalog {
    async fn search(&self, query: &str, kind: SearchKind) -> ApiResult<Value> {
        self.calls.lock().unwrap().push((query.to_string(), kind));
        if let Some(message) = &self.fail_with {
            return Err(ApiError::Upstream(message.clone()));
        }
        Ok(json!({
            "tracks": {"items": [{"id": "t1", "name": "Idol", "artists": []}]}
        }))
    }
}

fn app(catalog: Arc<FakeCatalog>) -> axum::Router {
    build_router(AppState::new(catalog))
}

fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .header("origin", "http://localhost:3000")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health() {
    let response = app(Arc::default())
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "encore-proxy");
}

fn assert_cors(response: &Response) {
    let headers = response.headers();
    assert_eq!(headers.get("access-control-allow-origin").unwrap(), "*");
    assert_eq!(
        headers.get("access-control-allow-headers").unwrap(),
        "authorization, x-client-info, apikey, content-type"
    );
}

#[tokio::test]
async fn test_options_answers_ok() {
    for uri in [
        "/spotify-search",
        "/music-link-generator",
        "/functions/v1/spotify-search",
        "/functions/v1/music-link-generator",
    ] {
        let response = app(Arc::default())
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri(uri)
                    .header("origin", "http://localhost:3000")
                    .header("access-control-request-method", "POST")
                    .header("access-control-request-headers", "apikey, content-type")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK, "{}", uri);
        assert_cors(&response);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"ok", "{}", uri);
    }
}

#[tokio::test]
async fn test_search_passes_provider_response_through() {
    let catalog = Arc::new(FakeCatalog::default());

    let response = app(catalog.clone())
        .oneshot(post_json("/spotify-search", r#"{"query":"idol"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_cors(&response);
    let body = json_body(response).await;
    assert_eq!(body["tracks"]["items"][0]["id"], "t1");
    assert_eq!(
        catalog.calls.lock().unwrap().as_slice(),
        &[("idol".to_string(), SearchKind::Track)]
    );
}

#[tokio::test]
async fn test_search_artist_kind() {
    let catalog = Arc::new(FakeCatalog::default());

    app(catalog.clone())
        .oneshot(post_json(
            "/functions/v1/spotify-search",
            r#"{"query":"yoasobi","type":"artist"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(catalog.calls.lock().unwrap()[0].1, SearchKind::Artist);
}

#[tokio::test]
async fn test_missing_query_is_bad_request_with_cors() {
    let catalog = Arc::new(FakeCatalog::default());

    for body in [r#"{}"#, r#"{"query":"   "}"#] {
        let response = app(catalog.clone())
            .oneshot(post_json("/spotify-search", body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_cors(&response);
        assert_eq!(
            json_body(response).await,
            json!({"error": "Search query is missing"})
        );
    }
    assert!(catalog.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_upstream_failure_is_server_error() {
    let catalog = Arc::new(FakeCatalog {
        fail_with: Some("Failed to get access token from Spotify.".to_string()),
        ..Default::default()
    });

    let response = app(catalog)
        .oneshot(post_json("/spotify-search", r#"{"query":"idol"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_cors(&response);
    assert_eq!(
        json_body(response).await["error"],
        "Failed to get access token from Spotify."
    );
}

#[tokio::test]
async fn test_malformed_body_is_server_error() {
    let response = app(Arc::default())
        .oneshot(post_json("/spotify-search", "not json"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(json_body(response).await["error"].is_string());
}

#[tokio::test]
async fn test_music_links_are_uri_component_encoded() {
    let response = app(Arc::default())
        .oneshot(post_json(
            "/functions/v1/music-link-generator",
            r#"{"song_name":"Don't Stop (Live)","artist_name":"Fleetwood Mac"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(
        body,
        json!({
            "spotify": "https://open.spotify.com/search/Don't%20Stop%20(Live)%20Fleetwood%20Mac",
            "youtubeMusic": "https://music.youtube.com/search?q=Don't%20Stop%20(Live)%20Fleetwood%20Mac",
            "appleMusic": "https://music.apple.com/search?term=Don't%20Stop%20(Live)%20Fleetwood%20Mac"
        })
    );
}

#[tokio::test]
async fn test_music_links_missing_field_is_server_error() {
    for body in [r#"{"song_name":"Idol"}"#, r#"{"song_name":"Idol","artist_name":""}"#] {
        let response = app(Arc::default())
            .oneshot(post_json("/music-link-generator", body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_cors(&response);
        assert_eq!(
            json_body(response).await,
            json!({"error": "Song name and artist name are required."})
        );
    }
}
