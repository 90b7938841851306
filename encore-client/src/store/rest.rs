//! Hosted backend adapter (PostgREST surface)
//!
//! Every request carries the project's anon key as `apikey` and the current
//! session's access token as the bearer credential, falling back to the anon
//! key when signed out. Row-level policies on the backend scope writes to
//! the caller.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use encore_common::models::{
    AttendedConcert, Comment, FavoriteArtist, FavoriteSong, Follow, FollowUser, NewAttendedConcert,
    NewComment, NewFavoriteArtist, NewFavoriteSong, NewPost, Post, Profile, ProfileUpdate,
    SortPositionUpdate, TimelineFilter, TimelinePost, UserId,
};
use encore_common::{Error, Result, SessionContext};
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use super::{ConcertStore, FavoriteArtistStore, FavoriteSongStore, PostStore, SocialStore};

const USER_AGENT: &str = concat!("encore/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT_SECS: u64 = 30;

const PREFER_REPRESENTATION: &str = "return=representation";
const PREFER_MERGE: &str = "resolution=merge-duplicates,return=minimal";

/// Comment select with the author embedded
const COMMENT_SELECT: &str = "*,profiles(username,avatar_url)";

/// Store adapter for the hosted backend's REST API
pub struct RestStore {
    http_client: reqwest::Client,
    base_url: String,
    anon_key: String,
    session: Arc<SessionContext>,
}

impl RestStore {
    pub fn new(base_url: &str, anon_key: &str, session: Arc<SessionContext>) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
            session,
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let token = self
            .session
            .access_token()
            .unwrap_or_else(|| self.anon_key.clone());

        self.http_client
            .request(method, format!("{}/rest/v1/{}", self.base_url, path))
            .header("apikey", &self.anon_key)
            .bearer_auth(token)
    }

    fn rpc(&self, function: &str, params: Value) -> RequestBuilder {
        self.request(Method::POST, &format!("rpc/{}", function))
            .json(&params)
    }

    async fn execute(&self, request: RequestBuilder) -> Result<Response> {
        let response = request
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(error_from_response(status.as_u16(), &body))
    }

    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = self.execute(request).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Insert returning the stored row
    async fn insert_one<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        what: &str,
    ) -> Result<T> {
        let rows: Vec<T> = self
            .fetch(request.header("Prefer", PREFER_REPRESENTATION))
            .await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| Error::Internal(format!("{} write returned no row", what)))
    }

    /// Delete returning how many rows matched
    async fn delete_counted(&self, request: RequestBuilder) -> Result<u64> {
        let rows: Vec<Value> = self
            .fetch(request.header("Prefer", PREFER_REPRESENTATION))
            .await?;
        Ok(rows.len() as u64)
    }
}

/// Map a non-success response to the error enum.
///
/// PostgREST error bodies carry a `message` field; anything else is kept
/// verbatim.
fn error_from_response(status: u16, body: &str) -> Error {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.get("message")
                .or_else(|| v.get("error"))
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.to_string());

    match status {
        409 => Error::Conflict(message),
        404 => Error::NotFound(message),
        _ => Error::Remote { status, message },
    }
}

fn eq(value: impl std::fmt::Display) -> String {
    format!("eq.{}", value)
}

#[async_trait]
impl FavoriteSongStore for RestStore {
    async fn list_favorite_songs(&self, user_id: UserId) -> Result<Vec<FavoriteSong>> {
        self.fetch(self.request(Method::GET, "favorite_songs").query(&[
            ("select", "*".to_string()),
            ("user_id", eq(user_id)),
            ("order", "sort_order.asc,id.asc".to_string()),
        ]))
        .await
    }

    async fn insert_favorite_song(&self, song: &NewFavoriteSong) -> Result<FavoriteSong> {
        self.insert_one(
            self.request(Method::POST, "favorite_songs").json(song),
            "Favorite song",
        )
        .await
    }

    async fn upsert_sort_positions(&self, updates: &[SortPositionUpdate]) -> Result<()> {
        self.execute(
            self.request(Method::POST, "favorite_songs")
                .query(&[("on_conflict", "id")])
                .header("Prefer", PREFER_MERGE)
                .json(updates),
        )
        .await?;
        debug!(rows = updates.len(), "Upserted sort positions");
        Ok(())
    }

    async fn delete_favorite_song(&self, user_id: UserId, id: i64) -> Result<u64> {
        self.delete_counted(
            self.request(Method::DELETE, "favorite_songs")
                .query(&[("id", eq(id)), ("user_id", eq(user_id))]),
        )
        .await
    }
}

#[async_trait]
impl FavoriteArtistStore for RestStore {
    async fn list_favorite_artists(&self, user_id: UserId) -> Result<Vec<FavoriteArtist>> {
        self.fetch(self.request(Method::GET, "favorite_artists").query(&[
            ("select", "*".to_string()),
            ("user_id", eq(user_id)),
            ("order", "id.asc".to_string()),
        ]))
        .await
    }

    async fn insert_favorite_artist(&self, artist: &NewFavoriteArtist) -> Result<FavoriteArtist> {
        self.insert_one(
            self.request(Method::POST, "favorite_artists").json(artist),
            "Favorite artist",
        )
        .await
    }

    async fn delete_favorite_artist(&self, user_id: UserId, id: i64) -> Result<u64> {
        self.delete_counted(
            self.request(Method::DELETE, "favorite_artists")
                .query(&[("id", eq(id)), ("user_id", eq(user_id))]),
        )
        .await
    }
}

#[async_trait]
impl PostStore for RestStore {
    async fn fetch_timeline(
        &self,
        viewer: UserId,
        filter: &TimelineFilter,
    ) -> Result<Vec<TimelinePost>> {
        self.fetch(self.rpc(
            "get_timeline_posts",
            json!({
                "p_user_id": viewer,
                "p_filter_type": filter.kind(),
                "p_artist_id": filter.artist_id(),
            }),
        ))
        .await
    }

    async fn insert_post(&self, post: &NewPost) -> Result<Post> {
        self.insert_one(self.request(Method::POST, "posts").json(post), "Post")
            .await
    }

    async fn insert_like(&self, post_id: i64, user_id: UserId) -> Result<()> {
        self.execute(
            self.request(Method::POST, "likes")
                .json(&json!({ "post_id": post_id, "user_id": user_id })),
        )
        .await?;
        Ok(())
    }

    async fn delete_like(&self, post_id: i64, user_id: UserId) -> Result<()> {
        self.execute(
            self.request(Method::DELETE, "likes")
                .query(&[("post_id", eq(post_id)), ("user_id", eq(user_id))]),
        )
        .await?;
        Ok(())
    }

    async fn insert_comment(&self, comment: &NewComment) -> Result<Comment> {
        self.insert_one(
            self.request(Method::POST, "comments")
                .query(&[("select", COMMENT_SELECT)])
                .json(comment),
            "Comment",
        )
        .await
    }
}

#[async_trait]
impl SocialStore for RestStore {
    async fn is_following(&self, follow: &Follow) -> Result<bool> {
        let rows: Vec<Value> = self
            .fetch(self.request(Method::GET, "followers").query(&[
                ("select", "follower_id".to_string()),
                ("follower_id", eq(follow.follower_id)),
                ("following_id", eq(follow.following_id)),
            ]))
            .await?;
        Ok(!rows.is_empty())
    }

    async fn insert_follow(&self, follow: &Follow) -> Result<()> {
        self.execute(self.request(Method::POST, "followers").json(follow))
            .await?;
        Ok(())
    }

    async fn delete_follow(&self, follow: &Follow) -> Result<()> {
        self.execute(self.request(Method::DELETE, "followers").query(&[
            ("follower_id", eq(follow.follower_id)),
            ("following_id", eq(follow.following_id)),
        ]))
        .await?;
        Ok(())
    }

    async fn list_followers(&self, user_id: UserId) -> Result<Vec<FollowUser>> {
        self.fetch(self.rpc("get_followers", json!({ "p_user_id": user_id })))
            .await
    }

    async fn list_following(&self, user_id: UserId) -> Result<Vec<FollowUser>> {
        self.fetch(self.rpc("get_following", json!({ "p_user_id": user_id })))
            .await
    }

    async fn get_profile(&self, user_id: UserId) -> Result<Option<Profile>> {
        let rows: Vec<Profile> = self
            .fetch(
                self.request(Method::GET, "profiles")
                    .query(&[("select", "*".to_string()), ("id", eq(user_id))]),
            )
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn update_profile(&self, user_id: UserId, update: &ProfileUpdate) -> Result<Profile> {
        let mut body = serde_json::to_value(update)?;
        body["updated_at"] = json!(Utc::now());

        let rows: Vec<Profile> = self
            .fetch(
                self.request(Method::PATCH, "profiles")
                    .query(&[("id", eq(user_id))])
                    .header("Prefer", PREFER_REPRESENTATION)
                    .json(&body),
            )
            .await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| Error::NotFound(format!("Profile {}", user_id)))
    }
}

/// `user_attended_concerts` row with its concert embedded
#[derive(Debug, Deserialize)]
struct AttendedRow {
    concert_id: i64,
    user_id: UserId,
    #[serde(default)]
    notes: Option<String>,
    concerts: ConcertRow,
}

#[derive(Debug, Deserialize)]
struct ConcertRow {
    event_date: NaiveDate,
    artist_name: String,
    venue_name: String,
    #[serde(default)]
    event_name: Option<String>,
}

impl From<AttendedRow> for AttendedConcert {
    fn from(row: AttendedRow) -> Self {
        AttendedConcert {
            concert_id: row.concert_id,
            user_id: row.user_id,
            event_date: row.concerts.event_date,
            artist_name: row.concerts.artist_name,
            venue_name: row.concerts.venue_name,
            event_name: row.concerts.event_name,
            notes: row.notes,
        }
    }
}

#[async_trait]
impl ConcertStore for RestStore {
    async fn add_attended_concert(
        &self,
        user_id: UserId,
        concert: &NewAttendedConcert,
    ) -> Result<AttendedConcert> {
        // The procedure links the concert to the caller identified by the token
        self.execute(self.rpc(
            "add_attended_concert",
            json!({
                "p_event_date": concert.event_date,
                "p_artist_name": concert.artist_name,
                "p_venue_name": concert.venue_name,
                "p_event_name": concert.event_name,
                "p_notes": concert.notes,
            }),
        ))
        .await?;

        self.list_attended_concerts(user_id)
            .await?
            .into_iter()
            .find(|c| {
                c.event_date == concert.event_date
                    && c.artist_name == concert.artist_name
                    && c.venue_name == concert.venue_name
            })
            .ok_or_else(|| Error::NotFound("Attended concert after insert".to_string()))
    }

    async fn list_attended_concerts(&self, user_id: UserId) -> Result<Vec<AttendedConcert>> {
        let rows: Vec<AttendedRow> = self
            .fetch(self.request(Method::GET, "user_attended_concerts").query(&[
                (
                    "select",
                    "concert_id,user_id,notes,concerts(event_date,artist_name,venue_name,event_name)"
                        .to_string(),
                ),
                ("user_id", eq(user_id)),
            ]))
            .await?;

        let mut concerts: Vec<AttendedConcert> = rows.into_iter().map(Into::into).collect();
        concerts.sort_by(|a, b| {
            b.event_date
                .cmp(&a.event_date)
                .then(b.concert_id.cmp(&a.concert_id))
        });
        Ok(concerts)
    }
}
