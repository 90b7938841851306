//! Ordered favorite songs
//!
//! Owns one user's ranked list. Positions are 0-based and dense after every
//! successful reorder. Removal leaves gaps that the next reorder repairs.
//! Reorders are applied optimistically and never survive a failed write:
//! the list is reloaded from the store, or rolled back when that fails too.

use std::sync::Arc;

use encore_common::catalog::CatalogTrack;
use encore_common::models::{FavoriteSong, SortPositionUpdate, UserId};
use encore_common::{Error, Result};
use tracing::{error, info, warn};

use crate::optimistic::OptimisticList;
use crate::store::FavoriteSongStore;

/// Dense 0-based rank rows for a list in display order
pub fn sort_updates(songs: &[FavoriteSong]) -> Vec<SortPositionUpdate> {
    songs
        .iter()
        .enumerate()
        .map(|(index, song)| SortPositionUpdate {
            id: song.id,
            user_id: song.user_id,
            sort_order: index as i32,
        })
        .collect()
}

/// Ranked favorite songs of one user
pub struct FavoritesManager<S: ?Sized> {
    store: Arc<S>,
    user_id: UserId,
    songs: OptimisticList<FavoriteSong>,
}

impl<S> FavoritesManager<S>
where
    S: FavoriteSongStore + ?Sized,
{
    pub fn new(store: Arc<S>, user_id: UserId) -> Self {
        Self {
            store,
            user_id,
            songs: OptimisticList::default(),
        }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Current list in display order
    pub fn songs(&self) -> &[FavoriteSong] {
        self.songs.items()
    }

    /// Fetch the list ordered by rank. On failure the previous list is kept.
    pub async fn load(&mut self) -> Result<&[FavoriteSong]> {
        match self.store.list_favorite_songs(self.user_id).await {
            Ok(songs) => {
                info!(user_id = %self.user_id, count = songs.len(), "Loaded favorite songs");
                self.songs.set(songs);
                Ok(self.songs.items())
            }
            Err(e) => {
                error!(user_id = %self.user_id, error = %e, "Failed to load favorite songs");
                Err(e)
            }
        }
    }

    /// Append a search result at the end of the list.
    ///
    /// A song whose name and artist match an entry already in memory is
    /// rejected without a store call.
    pub async fn add(&mut self, track: &CatalogTrack) -> Result<FavoriteSong> {
        let candidate = track.to_favorite(self.user_id, self.songs.len() as i32);

        if self.songs.items().iter().any(|s| candidate.same_song_as(s)) {
            return Err(Error::Duplicate(format!(
                "{} by {} is already in your favorites",
                candidate.song_name, candidate.artist_name
            )));
        }

        match self.store.insert_favorite_song(&candidate).await {
            Ok(song) => {
                info!(
                    user_id = %self.user_id,
                    song_id = %song.song_id,
                    sort_order = song.sort_order,
                    "Added favorite song"
                );
                self.songs.confirmed_mut().push(song.clone());
                Ok(song)
            }
            Err(e) => {
                error!(user_id = %self.user_id, error = %e, "Failed to add favorite song");
                Err(e)
            }
        }
    }

    /// Persist a new order given as the full sequence of row ids.
    ///
    /// The sequence must be a permutation of the current ids. The current
    /// order is a no-op.
    pub async fn reorder(&mut self, ordered_ids: &[i64]) -> Result<()> {
        let current: Vec<i64> = self.songs.items().iter().map(|s| s.id).collect();
        if ordered_ids == current.as_slice() {
            return Ok(());
        }
        if !is_permutation(&current, ordered_ids) {
            return Err(Error::InvalidInput(
                "Reorder must list every favorite song exactly once".to_string(),
            ));
        }

        let reordered = ordered_ids
            .iter()
            .filter_map(|id| self.songs.items().iter().find(|s| s.id == *id).cloned())
            .collect();
        self.commit_order(reordered).await
    }

    /// Move the song at `from` to index `to` (drag and drop)
    pub async fn move_song(&mut self, from: usize, to: usize) -> Result<()> {
        let len = self.songs.len();
        if from >= len || to >= len {
            return Err(Error::InvalidInput(format!(
                "Move {} -> {} is outside a list of {}",
                from, to, len
            )));
        }
        if from == to {
            return Ok(());
        }

        let mut reordered = self.songs.items().to_vec();
        let song = reordered.remove(from);
        reordered.insert(to, song);
        self.commit_order(reordered).await
    }

    /// Delete one song. Remaining positions are left as they are.
    pub async fn remove(&mut self, song_id: i64) -> Result<()> {
        match self.store.delete_favorite_song(self.user_id, song_id).await {
            Ok(0) => Err(Error::NotFound(format!("Favorite song {}", song_id))),
            Ok(_) => {
                info!(user_id = %self.user_id, id = song_id, "Removed favorite song");
                self.songs.confirmed_mut().retain(|s| s.id != song_id);
                Ok(())
            }
            Err(e) => {
                error!(user_id = %self.user_id, id = song_id, error = %e, "Failed to remove favorite song");
                Err(e)
            }
        }
    }

    async fn commit_order(&mut self, reordered: Vec<FavoriteSong>) -> Result<()> {
        let updates = sort_updates(&reordered);

        self.songs.apply(move |items| {
            *items = reordered;
            for (index, song) in items.iter_mut().enumerate() {
                song.sort_order = index as i32;
            }
        });

        match self.store.upsert_sort_positions(&updates).await {
            Ok(()) => {
                self.songs.confirm();
                info!(user_id = %self.user_id, count = updates.len(), "Saved favorite order");
                Ok(())
            }
            Err(e) => {
                error!(user_id = %self.user_id, error = %e, "Failed to save favorite order");
                let canonical = match self.store.list_favorite_songs(self.user_id).await {
                    Ok(songs) => Some(songs),
                    Err(reload) => {
                        warn!(user_id = %self.user_id, error = %reload, "Reload after failed reorder failed, rolling back");
                        None
                    }
                };
                self.songs.reconcile(canonical);
                Err(e)
            }
        }
    }
}

fn is_permutation(current: &[i64], candidate: &[i64]) -> bool {
    if current.len() != candidate.len() {
        return false;
    }
    let mut a = current.to_vec();
    let mut b = candidate.to_vec();
    a.sort_unstable();
    b.sort_unstable();
    a == b
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn song(id: i64, user_id: UserId, sort_order: i32) -> FavoriteSong {
        FavoriteSong {
            id,
            user_id,
            song_id: format!("track-{}", id),
            song_name: format!("Song {}", id),
            artist_name: "Artist".to_string(),
            album_art_url: None,
            sort_order,
        }
    }

    #[test]
    fn test_sort_updates_are_dense() {
        let user = Uuid::new_v4();
        let songs = vec![song(7, user, 4), song(3, user, 9), song(5, user, 0)];
        let updates = sort_updates(&songs);
        let ranks: Vec<(i64, i32)> = updates.iter().map(|u| (u.id, u.sort_order)).collect();
        assert_eq!(ranks, vec![(7, 0), (3, 1), (5, 2)]);
        assert!(updates.iter().all(|u| u.user_id == user));
    }

    #[test]
    fn test_sort_updates_empty() {
        assert!(sort_updates(&[]).is_empty());
    }

    #[test]
    fn test_is_permutation() {
        assert!(is_permutation(&[1, 2, 3], &[3, 1, 2]));
        assert!(!is_permutation(&[1, 2, 3], &[1, 2]));
        assert!(!is_permutation(&[1, 2, 3], &[1, 2, 2]));
        assert!(!is_permutation(&[1, 2, 3], &[1, 2, 4]));
    }
}
