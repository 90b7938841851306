//! Favorite artists

use std::sync::Arc;

use encore_common::catalog::CatalogArtist;
use encore_common::models::{FavoriteArtist, TimelineFilter, UserId};
use encore_common::{Error, Result};
use tracing::{error, info};

use crate::store::FavoriteArtistStore;

/// Unordered favorite artists of one user
pub struct ArtistsManager<S: ?Sized> {
    store: Arc<S>,
    user_id: UserId,
    artists: Vec<FavoriteArtist>,
}

impl<S> ArtistsManager<S>
where
    S: FavoriteArtistStore + ?Sized,
{
    pub fn new(store: Arc<S>, user_id: UserId) -> Self {
        Self {
            store,
            user_id,
            artists: Vec::new(),
        }
    }

    pub fn artists(&self) -> &[FavoriteArtist] {
        &self.artists
    }

    /// One Artist filter per favorite, for the timeline filter menu
    pub fn filter_options(&self) -> Vec<TimelineFilter> {
        self.artists
            .iter()
            .map(|a| TimelineFilter::Artist(a.artist_id.clone()))
            .collect()
    }

    pub async fn load(&mut self) -> Result<&[FavoriteArtist]> {
        match self.store.list_favorite_artists(self.user_id).await {
            Ok(artists) => {
                info!(user_id = %self.user_id, count = artists.len(), "Loaded favorite artists");
                self.artists = artists;
                Ok(&self.artists)
            }
            Err(e) => {
                error!(user_id = %self.user_id, error = %e, "Failed to load favorite artists");
                Err(e)
            }
        }
    }

    /// Add a search result; an artist already in memory is rejected locally
    pub async fn add(&mut self, artist: &CatalogArtist) -> Result<FavoriteArtist> {
        if self.artists.iter().any(|a| a.artist_id == artist.id) {
            return Err(Error::Duplicate(format!(
                "{} is already in your favorite artists",
                artist.name
            )));
        }

        let candidate = artist.to_favorite(self.user_id);
        match self.store.insert_favorite_artist(&candidate).await {
            Ok(stored) => {
                info!(user_id = %self.user_id, artist_id = %stored.artist_id, "Added favorite artist");
                self.artists.push(stored.clone());
                Ok(stored)
            }
            Err(e) => {
                error!(user_id = %self.user_id, error = %e, "Failed to add favorite artist");
                Err(e)
            }
        }
    }

    pub async fn remove(&mut self, id: i64) -> Result<()> {
        match self.store.delete_favorite_artist(self.user_id, id).await {
            Ok(0) => Err(Error::NotFound(format!("Favorite artist {}", id))),
            Ok(_) => {
                info!(user_id = %self.user_id, id, "Removed favorite artist");
                self.artists.retain(|a| a.id != id);
                Ok(())
            }
            Err(e) => {
                error!(user_id = %self.user_id, id, error = %e, "Failed to remove favorite artist");
                Err(e)
            }
        }
    }
}
