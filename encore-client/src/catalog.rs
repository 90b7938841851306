//! Catalog search client
//!
//! Talks to the proxy functions rather than the catalog provider, so no
//! provider credentials live on the client.

use std::time::Duration;

use encore_common::catalog::{
    CatalogArtist, CatalogTrack, MusicLinkRequest, MusicLinks, SearchKind, SearchRequest,
    SearchResults,
};
use encore_common::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error};

const USER_AGENT: &str = concat!("encore/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT_SECS: u64 = 30;

pub struct CatalogClient {
    http_client: reqwest::Client,
    functions_url: String,
    anon_key: Option<String>,
}

impl CatalogClient {
    /// `functions_url` is the base the proxy routes hang off, e.g.
    /// `http://127.0.0.1:5740` or `<project>/functions/v1`
    pub fn new(functions_url: &str, anon_key: Option<String>) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            functions_url: functions_url.trim_end_matches('/').to_string(),
            anon_key,
        })
    }

    async fn invoke<B, T>(&self, function: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let mut request = self
            .http_client
            .post(format!("{}/{}", self.functions_url, function))
            .json(body);
        if let Some(key) = &self.anon_key {
            request = request.header("apikey", key).bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_slice::<Value>(&bytes)
                .ok()
                .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
                .unwrap_or_else(|| String::from_utf8_lossy(&bytes).into_owned());
            error!(function, status = status.as_u16(), %message, "Catalog function failed");
            return Err(Error::Remote {
                status: status.as_u16(),
                message,
            });
        }

        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Search the catalog; a blank query is rejected without a request
    pub async fn search(&self, query: &str, kind: SearchKind) -> Result<SearchResults> {
        let query = query.trim();
        if query.is_empty() {
            return Err(Error::InvalidInput("Search query is empty".to_string()));
        }

        debug!(query, kind = kind.as_str(), "Searching catalog");
        self.invoke(
            "spotify-search",
            &SearchRequest {
                query: Some(query.to_string()),
                kind: Some(kind),
            },
        )
        .await
    }

    pub async fn search_tracks(&self, query: &str) -> Result<Vec<CatalogTrack>> {
        let results = self.search(query, SearchKind::Track).await?;
        Ok(results.tracks.map(|page| page.items).unwrap_or_default())
    }

    pub async fn search_artists(&self, query: &str) -> Result<Vec<CatalogArtist>> {
        let results = self.search(query, SearchKind::Artist).await?;
        Ok(results.artists.map(|page| page.items).unwrap_or_default())
    }

    /// Streaming-provider search links for a song
    pub async fn music_links(&self, song_name: &str, artist_name: &str) -> Result<MusicLinks> {
        if song_name.trim().is_empty() || artist_name.trim().is_empty() {
            return Err(Error::InvalidInput(
                "Song name and artist name are required".to_string(),
            ));
        }

        self.invoke(
            "music-link-generator",
            &MusicLinkRequest {
                song_name: Some(song_name.to_string()),
                artist_name: Some(artist_name.to_string()),
            },
        )
        .await
    }
}
