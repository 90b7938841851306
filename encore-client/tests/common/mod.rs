//! Shared fixtures for encore-client integration tests

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use encore_client::store::{
    ConcertStore, FavoriteArtistStore, FavoriteSongStore, PostStore, SocialStore, SqliteStore,
};
use encore_common::catalog::{ArtistRef, CatalogAlbum, CatalogArtist, CatalogImage, CatalogTrack};
use encore_common::models::{
    AttendedConcert, Comment, FavoriteArtist, FavoriteSong, Follow, FollowUser, NewAttendedConcert,
    NewComment, NewFavoriteArtist, NewFavoriteSong, NewPost, Post, Profile, ProfileUpdate,
    SortPositionUpdate, TimelineFilter, TimelinePost, UserId,
};
use encore_common::{Error, Result};
use uuid::Uuid;

/// SQLite store that records every call and fails the operations it is told to
pub struct ScriptedStore {
    pub inner: SqliteStore,
    calls: Mutex<Vec<&'static str>>,
    failing: Mutex<HashSet<&'static str>>,
    last_upsert: Mutex<Vec<SortPositionUpdate>>,
}

impl ScriptedStore {
    pub async fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: SqliteStore::in_memory().await.unwrap(),
            calls: Mutex::new(Vec::new()),
            failing: Mutex::new(HashSet::new()),
            last_upsert: Mutex::new(Vec::new()),
        })
    }

    /// New store plus a user with a profile row
    pub async fn with_user(username: &str) -> (Arc<Self>, UserId) {
        let store = Self::new().await;
        let user = store.add_user(username).await;
        (store, user)
    }

    pub async fn add_user(&self, username: &str) -> UserId {
        let user = Uuid::new_v4();
        self.inner.ensure_profile(user, Some(username)).await.unwrap();
        user
    }

    pub fn fail(&self, op: &'static str) {
        self.failing.lock().unwrap().insert(op);
    }

    pub fn heal(&self, op: &'static str) {
        self.failing.lock().unwrap().remove(op);
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, op: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| **c == op).count()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn last_upsert(&self) -> Vec<SortPositionUpdate> {
        self.last_upsert.lock().unwrap().clone()
    }

    fn record(&self, op: &'static str) -> Result<()> {
        self.calls.lock().unwrap().push(op);
        if self.failing.lock().unwrap().contains(op) {
            return Err(Error::Remote {
                status: 503,
                message: format!("{} unavailable", op),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl FavoriteSongStore for ScriptedStore {
    async fn list_favorite_songs(&self, user_id: UserId) -> Result<Vec<FavoriteSong>> {
        self.record("list_favorite_songs")?;
        self.inner.list_favorite_songs(user_id).await
    }

    async fn insert_favorite_song(&self, song: &NewFavoriteSong) -> Result<FavoriteSong> {
        self.record("insert_favorite_song")?;
        self.inner.insert_favorite_song(song).await
    }

    async fn upsert_sort_positions(&self, updates: &[SortPositionUpdate]) -> Result<()> {
        *self.last_upsert.lock().unwrap() = updates.to_vec();
        self.record("upsert_sort_positions")?;
        self.inner.upsert_sort_positions(updates).await
    }

    async fn delete_favorite_song(&self, user_id: UserId, id: i64) -> Result<u64> {
        self.record("delete_favorite_song")?;
        self.inner.delete_favorite_song(user_id, id).await
    }
}

#[async_trait]
impl FavoriteArtistStore for ScriptedStore {
    async fn list_favorite_artists(&self, user_id: UserId) -> Result<Vec<FavoriteArtist>> {
        self.record("list_favorite_artists")?;
        self.inner.list_favorite_artists(user_id).await
    }

    async fn insert_favorite_artist(&self, artist: &NewFavoriteArtist) -> Result<FavoriteArtist> {
        self.record("insert_favorite_artist")?;
        self.inner.insert_favorite_artist(artist).await
    }

    async fn delete_favorite_artist(&self, user_id: UserId, id: i64) -> Result<u64> {
        self.record("delete_favorite_artist")?;
        self.inner.delete_favorite_artist(user_id, id).await
    }
}

#[async_trait]
impl PostStore for ScriptedStore {
    async fn fetch_timeline(
        &self,
        viewer: UserId,
        filter: &TimelineFilter,
    ) -> Result<Vec<TimelinePost>> {
        self.record("fetch_timeline")?;
        self.inner.fetch_timeline(viewer, filter).await
    }

    async fn insert_post(&self, post: &NewPost) -> Result<Post> {
        self.record("insert_post")?;
        self.inner.insert_post(post).await
    }

    async fn insert_like(&self, post_id: i64, user_id: UserId) -> Result<()> {
        self.record("insert_like")?;
        self.inner.insert_like(post_id, user_id).await
    }

    async fn delete_like(&self, post_id: i64, user_id: UserId) -> Result<()> {
        self.record("delete_like")?;
        self.inner.delete_like(post_id, user_id).await
    }

    async fn insert_comment(&self, comment: &NewComment) -> Result<Comment> {
        self.record("insert_comment")?;
        self.inner.insert_comment(comment).await
    }
}

#[async_trait]
impl SocialStore for ScriptedStore {
    async fn is_following(&self, follow: &Follow) -> Result<bool> {
        self.record("is_following")?;
        self.inner.is_following(follow).await
    }

    async fn insert_follow(&self, follow: &Follow) -> Result<()> {
        self.record("insert_follow")?;
        self.inner.insert_follow(follow).await
    }

    async fn delete_follow(&self, follow: &Follow) -> Result<()> {
        self.record("delete_follow")?;
        self.inner.delete_follow(follow).await
    }

    async fn list_followers(&self, user_id: UserId) -> Result<Vec<FollowUser>> {
        self.record("list_followers")?;
        self.inner.list_followers(user_id).await
    }

    async fn list_following(&self, user_id: UserId) -> Result<Vec<FollowUser>> {
        self.record("list_following")?;
        self.inner.list_following(user_id).await
    }

    async fn get_profile(&self, user_id: UserId) -> Result<Option<Profile>> {
        self.record("get_profile")?;
        self.inner.get_profile(user_id).await
    }

    async fn update_profile(&self, user_id: UserId, update: &ProfileUpdate) -> Result<Profile> {
        self.record("update_profile")?;
        self.inner.update_profile(user_id, update).await
    }
}

#[async_trait]
impl ConcertStore for ScriptedStore {
    async fn add_attended_concert(
        &self,
        user_id: UserId,
        concert: &NewAttendedConcert,
    ) -> Result<AttendedConcert> {
        self.record("add_attended_concert")?;
        self.inner.add_attended_concert(user_id, concert).await
    }

    async fn list_attended_concerts(&self, user_id: UserId) -> Result<Vec<AttendedConcert>> {
        self.record("list_attended_concerts")?;
        self.inner.list_attended_concerts(user_id).await
    }
}

// ========================================
// Catalog fixtures
// ========================================

pub fn track(id: &str, name: &str, artist_id: &str, artist_name: &str) -> CatalogTrack {
    CatalogTrack {
        id: id.to_string(),
        name: name.to_string(),
        artists: vec![ArtistRef {
            id: artist_id.to_string(),
            name: artist_name.to_string(),
        }],
        album: Some(CatalogAlbum {
            id: None,
            name: None,
            images: vec![CatalogImage {
                url: format!("https://img.example/{}.jpg", id),
                width: None,
                height: None,
            }],
        }),
    }
}

pub fn artist(id: &str, name: &str) -> CatalogArtist {
    CatalogArtist {
        id: id.to_string(),
        name: name.to_string(),
        images: Vec::new(),
    }
}
