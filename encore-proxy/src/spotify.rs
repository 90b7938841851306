//! Catalog provider client
//!
//! Uses the client-credentials grant. The access token is cached until
//! shortly before it expires and dropped when the provider rejects it.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use encore_common::catalog::SearchKind;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::{ApiError, ApiResult};

const TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
const SEARCH_URL: &str = "https://api.spotify.com/v1/search";
const USER_AGENT: &str = concat!("encore-proxy/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT_SECS: u64 = 30;
const SEARCH_LIMIT: &str = "10";
/// Refresh this long before the provider's expiry
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Catalog search as seen by the HTTP handlers
#[async_trait]
pub trait CatalogSearch: Send + Sync {
    /// Provider search response, passed through unchanged
    async fn search(&self, query: &str, kind: SearchKind) -> ApiResult<Value>;
}

/// Client id and secret for the client-credentials grant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpotifyCredentials {
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

#[derive(Debug)]
struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

impl CachedToken {
    fn is_fresh(&self) -> bool {
        Instant::now() + TOKEN_EXPIRY_MARGIN < self.expires_at
    }
}

/// Catalog client for the Spotify Web API
pub struct SpotifyClient {
    http_client: reqwest::Client,
    credentials: Option<SpotifyCredentials>,
    token: Mutex<Option<CachedToken>>,
    token_url: String,
    search_url: String,
}

impl SpotifyClient {
    /// Client against the public endpoints. Without credentials every
    /// search fails with a configuration error.
    pub fn new(credentials: Option<SpotifyCredentials>) -> Result<Self, ApiError> {
        Self::with_endpoints(credentials, TOKEN_URL, SEARCH_URL)
    }

    /// Client against custom token and search endpoints
    pub fn with_endpoints(
        credentials: Option<SpotifyCredentials>,
        token_url: &str,
        search_url: &str,
    ) -> Result<Self, ApiError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| ApiError::Internal(e.to_string()))?;

        Ok(Self {
            http_client,
            credentials,
            token: Mutex::new(None),
            token_url: token_url.to_string(),
            search_url: search_url.to_string(),
        })
    }

    pub fn has_credentials(&self) -> bool {
        self.credentials.is_some()
    }

    async fn access_token(&self) -> ApiResult<String> {
        let credentials = self.credentials.as_ref().ok_or_else(|| {
            ApiError::NotConfigured(
                "Spotify credentials are not configured (SPOTIFY_CLIENT_ID, SPOTIFY_CLIENT_SECRET)"
                    .to_string(),
            )
        })?;

        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref().filter(|t| t.is_fresh()) {
            return Ok(token.access_token.clone());
        }

        let response = self
            .http_client
            .post(&self.token_url)
            .basic_auth(&credentials.client_id, Some(&credentials.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| ApiError::Upstream(format!("Token request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), %body, "Token request rejected");
            return Err(ApiError::Upstream(
                "Failed to get access token from Spotify.".to_string(),
            ));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| ApiError::Upstream(format!("Invalid token response: {}", e)))?;

        info!(expires_in = token.expires_in, "Obtained catalog access token");
        *cached = Some(CachedToken {
            access_token: token.access_token.clone(),
            expires_at: Instant::now() + Duration::from_secs(token.expires_in),
        });
        Ok(token.access_token)
    }

    async fn invalidate_token(&self) {
        *self.token.lock().await = None;
    }
}

#[async_trait]
impl CatalogSearch for SpotifyClient {
    async fn search(&self, query: &str, kind: SearchKind) -> ApiResult<Value> {
        let token = self.access_token().await?;

        debug!(query, kind = kind.as_str(), "Searching catalog");
        let response = self
            .http_client
            .get(&self.search_url)
            .bearer_auth(token)
            .query(&[("q", query), ("type", kind.as_str()), ("limit", SEARCH_LIMIT)])
            .send()
            .await
            .map_err(|e| ApiError::Upstream(format!("Search request failed: {}", e)))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            self.invalidate_token().await;
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Upstream(format!(
                "Search failed with status {}: {}",
                status.as_u16(),
                body
            )));
        }

        response
            .json()
            .await
            .map_err(|e| ApiError::Upstream(format!("Invalid search response: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cached_token_freshness() {
        let fresh = CachedToken {
            access_token: "t".into(),
            expires_at: Instant::now() + Duration::from_secs(3600),
        };
        assert!(fresh.is_fresh());

        let expiring = CachedToken {
            access_token: "t".into(),
            expires_at: Instant::now() + Duration::from_secs(30),
        };
        assert!(!expiring.is_fresh());
    }

    #[tokio::test]
    async fn test_missing_credentials_fail_before_any_request() {
        let client = SpotifyClient::with_endpoints(None, "http://127.0.0.1:9/token", "http://127.0.0.1:9/search")
            .unwrap();
        assert!(!client.has_credentials());

        let err = client.search("idol", SearchKind::Track).await.unwrap_err();
        assert!(matches!(err, ApiError::NotConfigured(_)));
    }

    #[test]
    fn test_token_response_default_expiry() {
        let token: TokenResponse = serde_json::from_str(r#"{"access_token":"abc"}"#).unwrap();
        assert_eq!(token.expires_in, 3600);
    }
}
