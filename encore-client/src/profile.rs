//! Profiles and the profile page overview

use std::sync::Arc;

use encore_common::models::{
    AttendedConcert, FavoriteArtist, FavoriteSong, Profile, ProfileUpdate, UserId,
};
use encore_common::{Error, Result};
use serde::Serialize;
use tracing::{error, info};

use crate::store::{ConcertStore, FavoriteArtistStore, FavoriteSongStore, SocialStore};

/// Everything the profile page shows, loaded together
#[derive(Debug, Clone, Serialize)]
pub struct ProfileOverview {
    pub profile: Option<Profile>,
    pub favorite_songs: Vec<FavoriteSong>,
    pub favorite_artists: Vec<FavoriteArtist>,
    pub concerts: Vec<AttendedConcert>,
    pub follower_count: usize,
    pub following_count: usize,
}

pub struct ProfileService<S: ?Sized> {
    store: Arc<S>,
}

impl<S> ProfileService<S>
where
    S: SocialStore + ?Sized,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Profile row of `user_id`; a missing row is `None`
    pub async fn load(&self, user_id: UserId) -> Result<Option<Profile>> {
        self.store.get_profile(user_id).await.inspect_err(|e| {
            error!(user_id = %user_id, error = %e, "Failed to load profile");
        })
    }

    /// Save profile edits of the signed-in user. The username must stay
    /// non-empty.
    pub async fn update(&self, user_id: UserId, mut changes: ProfileUpdate) -> Result<Profile> {
        let username = changes
            .username
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| Error::InvalidInput("Username is required".to_string()))?;
        changes.username = Some(username.to_string());

        let profile = self
            .store
            .update_profile(user_id, &changes)
            .await
            .inspect_err(|e| {
                error!(user_id = %user_id, error = %e, "Failed to update profile");
            })?;
        info!(user_id = %user_id, "Updated profile");
        Ok(profile)
    }
}

impl<S> ProfileService<S>
where
    S: SocialStore + FavoriteSongStore + FavoriteArtistStore + ConcertStore + ?Sized,
{
    /// Load every section of the profile page concurrently.
    ///
    /// Fails as a whole when any section fails.
    pub async fn overview(&self, user_id: UserId) -> Result<ProfileOverview> {
        let store = &self.store;
        let (profile, favorite_songs, favorite_artists, concerts, followers, following) =
            tokio::try_join!(
                store.get_profile(user_id),
                store.list_favorite_songs(user_id),
                store.list_favorite_artists(user_id),
                store.list_attended_concerts(user_id),
                store.list_followers(user_id),
                store.list_following(user_id)
            )
            .inspect_err(|e| {
                error!(user_id = %user_id, error = %e, "Failed to load profile overview");
            })?;

        Ok(ProfileOverview {
            profile,
            favorite_songs,
            favorite_artists,
            concerts,
            follower_count: followers.len(),
            following_count: following.len(),
        })
    }
}
