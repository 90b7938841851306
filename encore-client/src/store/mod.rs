//! Store ports
//!
//! Each manager depends only on the port it needs. Both adapters implement
//! every port, so any of them also satisfies [`DataStore`].

use async_trait::async_trait;
use encore_common::models::{
    AttendedConcert, Comment, FavoriteArtist, FavoriteSong, Follow, FollowUser, NewAttendedConcert,
    NewComment, NewFavoriteArtist, NewFavoriteSong, NewPost, Post, Profile, ProfileUpdate,
    SortPositionUpdate, TimelineFilter, TimelinePost, UserId,
};
use encore_common::Result;

pub mod rest;
pub mod sqlite;

pub use rest::RestStore;
pub use sqlite::SqliteStore;

/// Ranked favorite songs
#[async_trait]
pub trait FavoriteSongStore: Send + Sync {
    /// Songs of `user_id` ordered by `sort_order`, then id
    async fn list_favorite_songs(&self, user_id: UserId) -> Result<Vec<FavoriteSong>>;

    /// Insert and return the stored row
    async fn insert_favorite_song(&self, song: &NewFavoriteSong) -> Result<FavoriteSong>;

    /// Batch upsert of sort positions keyed by row id, all or nothing
    async fn upsert_sort_positions(&self, updates: &[SortPositionUpdate]) -> Result<()>;

    /// Delete scoped by (id, user); returns the number of rows removed
    async fn delete_favorite_song(&self, user_id: UserId, id: i64) -> Result<u64>;
}

/// Favorite artists
#[async_trait]
pub trait FavoriteArtistStore: Send + Sync {
    async fn list_favorite_artists(&self, user_id: UserId) -> Result<Vec<FavoriteArtist>>;

    async fn insert_favorite_artist(&self, artist: &NewFavoriteArtist) -> Result<FavoriteArtist>;

    async fn delete_favorite_artist(&self, user_id: UserId, id: i64) -> Result<u64>;
}

/// Posts with their likes and comments
#[async_trait]
pub trait PostStore: Send + Sync {
    /// Joined timeline for `viewer`, newest first
    async fn fetch_timeline(
        &self,
        viewer: UserId,
        filter: &TimelineFilter,
    ) -> Result<Vec<TimelinePost>>;

    async fn insert_post(&self, post: &NewPost) -> Result<Post>;

    async fn insert_like(&self, post_id: i64, user_id: UserId) -> Result<()>;

    async fn delete_like(&self, post_id: i64, user_id: UserId) -> Result<()>;

    /// Insert and return the comment joined with its author
    async fn insert_comment(&self, comment: &NewComment) -> Result<Comment>;
}

/// Follow graph and profiles
#[async_trait]
pub trait SocialStore: Send + Sync {
    async fn is_following(&self, follow: &Follow) -> Result<bool>;

    async fn insert_follow(&self, follow: &Follow) -> Result<()>;

    async fn delete_follow(&self, follow: &Follow) -> Result<()>;

    async fn list_followers(&self, user_id: UserId) -> Result<Vec<FollowUser>>;

    async fn list_following(&self, user_id: UserId) -> Result<Vec<FollowUser>>;

    async fn get_profile(&self, user_id: UserId) -> Result<Option<Profile>>;

    /// Apply a partial update and stamp `updated_at`
    async fn update_profile(&self, user_id: UserId, update: &ProfileUpdate) -> Result<Profile>;
}

/// Attended concerts
#[async_trait]
pub trait ConcertStore: Send + Sync {
    /// Find or create the concert, then link it to `user_id`
    async fn add_attended_concert(
        &self,
        user_id: UserId,
        concert: &NewAttendedConcert,
    ) -> Result<AttendedConcert>;

    async fn list_attended_concerts(&self, user_id: UserId) -> Result<Vec<AttendedConcert>>;
}

/// Every port at once, for callers that pick the adapter at runtime
pub trait DataStore:
    FavoriteSongStore + FavoriteArtistStore + PostStore + SocialStore + ConcertStore
{
}

impl<T> DataStore for T where
    T: FavoriteSongStore + FavoriteArtistStore + PostStore + SocialStore + ConcertStore
{
}
