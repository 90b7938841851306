//! Ordered favorites against the local store

mod common;

use common::{track, ScriptedStore};
use encore_client::store::FavoriteSongStore;
use encore_client::FavoritesManager;
use encore_common::Error;

async fn manager_with_songs(
    names: &[&str],
) -> (std::sync::Arc<ScriptedStore>, FavoritesManager<ScriptedStore>) {
    let (store, user) = ScriptedStore::with_user("mika").await;
    let mut favorites = FavoritesManager::new(store.clone(), user);
    favorites.load().await.unwrap();
    for (i, name) in names.iter().enumerate() {
        favorites
            .add(&track(&format!("t{}", i), name, "a1", "Band"))
            .await
            .unwrap();
    }
    store.clear_calls();
    (store, favorites)
}

fn names(favorites: &FavoritesManager<ScriptedStore>) -> Vec<String> {
    favorites.songs().iter().map(|s| s.song_name.clone()).collect()
}

fn positions(favorites: &FavoritesManager<ScriptedStore>) -> Vec<i32> {
    favorites.songs().iter().map(|s| s.sort_order).collect()
}

#[tokio::test]
async fn test_add_appends_at_list_length() {
    let (_store, favorites) = manager_with_songs(&["S0", "S1", "S2"]).await;

    assert_eq!(names(&favorites), vec!["S0", "S1", "S2"]);
    assert_eq!(positions(&favorites), vec![0, 1, 2]);
    assert_eq!(favorites.songs()[0].artist_name, "Band");
    assert_eq!(
        favorites.songs()[0].album_art_url.as_deref(),
        Some("https://img.example/t0.jpg")
    );
}

#[tokio::test]
async fn test_duplicate_add_makes_no_store_call() {
    let (store, mut favorites) = manager_with_songs(&["S0"]).await;

    // Different catalog id, same name and artist
    let err = favorites
        .add(&track("other-id", "S0", "a1", "Band"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Duplicate(_)));
    assert!(store.calls().is_empty());
    assert_eq!(favorites.songs().len(), 1);
}

#[tokio::test]
async fn test_same_title_by_other_artist_is_not_duplicate() {
    let (_store, mut favorites) = manager_with_songs(&["S0"]).await;
    favorites
        .add(&track("t9", "S0", "a2", "Other Band"))
        .await
        .unwrap();
    assert_eq!(favorites.songs().len(), 2);
}

#[tokio::test]
async fn test_move_last_to_first() {
    let (store, mut favorites) = manager_with_songs(&["S0", "S1", "S2"]).await;
    let ids: Vec<i64> = favorites.songs().iter().map(|s| s.id).collect();

    favorites.move_song(2, 0).await.unwrap();

    assert_eq!(names(&favorites), vec!["S2", "S0", "S1"]);
    assert_eq!(positions(&favorites), vec![0, 1, 2]);

    assert_eq!(store.calls(), vec!["upsert_sort_positions"]);
    let triples: Vec<(i64, i32)> = store
        .last_upsert()
        .iter()
        .map(|u| (u.id, u.sort_order))
        .collect();
    assert_eq!(triples, vec![(ids[2], 0), (ids[0], 1), (ids[1], 2)]);

    // Persisted: a fresh load sees the same order
    let reloaded = store
        .inner
        .list_favorite_songs(favorites.user_id())
        .await
        .unwrap();
    let reloaded: Vec<&str> = reloaded.iter().map(|s| s.song_name.as_str()).collect();
    assert_eq!(reloaded, vec!["S2", "S0", "S1"]);
}

#[tokio::test]
async fn test_move_to_same_index_is_noop() {
    let (store, mut favorites) = manager_with_songs(&["S0", "S1", "S2"]).await;

    favorites.move_song(1, 1).await.unwrap();

    assert!(store.calls().is_empty());
    assert_eq!(names(&favorites), vec!["S0", "S1", "S2"]);
}

#[tokio::test]
async fn test_move_out_of_range_is_rejected() {
    let (store, mut favorites) = manager_with_songs(&["S0", "S1"]).await;

    let err = favorites.move_song(0, 2).await.unwrap_err();

    assert!(matches!(err, Error::InvalidInput(_)));
    assert!(store.calls().is_empty());
}

#[tokio::test]
async fn test_reorder_requires_permutation() {
    let (store, mut favorites) = manager_with_songs(&["S0", "S1", "S2"]).await;
    let ids: Vec<i64> = favorites.songs().iter().map(|s| s.id).collect();

    let err = favorites.reorder(&[ids[0], ids[1]]).await.unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));

    let err = favorites
        .reorder(&[ids[0], ids[0], ids[1]])
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));

    // Current order
    favorites.reorder(&ids).await.unwrap();

    assert!(store.calls().is_empty());
}

#[tokio::test]
async fn test_failed_reorder_matches_fresh_load() {
    let (store, mut favorites) = manager_with_songs(&["S0", "S1", "S2"]).await;
    let ids: Vec<i64> = favorites.songs().iter().map(|s| s.id).collect();
    store.fail("upsert_sort_positions");

    let err = favorites
        .reorder(&[ids[1], ids[2], ids[0]])
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Remote { status: 503, .. }));
    assert_eq!(
        store.calls(),
        vec!["upsert_sort_positions", "list_favorite_songs"]
    );
    let fresh = store
        .inner
        .list_favorite_songs(favorites.user_id())
        .await
        .unwrap();
    assert_eq!(favorites.songs(), fresh.as_slice());
    assert_eq!(names(&favorites), vec!["S0", "S1", "S2"]);
}

#[tokio::test]
async fn test_failed_reorder_rolls_back_when_reload_fails() {
    let (store, mut favorites) = manager_with_songs(&["S0", "S1", "S2"]).await;
    let before = favorites.songs().to_vec();
    store.fail("upsert_sort_positions");
    store.fail("list_favorite_songs");

    assert!(favorites.move_song(0, 2).await.is_err());

    assert_eq!(favorites.songs(), before.as_slice());
}

#[tokio::test]
async fn test_remove_leaves_gap_until_next_reorder() {
    let (store, mut favorites) = manager_with_songs(&["S0", "S1", "S2"]).await;
    let middle = favorites.songs()[1].id;

    favorites.remove(middle).await.unwrap();
    assert_eq!(names(&favorites), vec!["S0", "S2"]);
    assert_eq!(positions(&favorites), vec![0, 2]);

    favorites.load().await.unwrap();
    assert_eq!(positions(&favorites), vec![0, 2]);

    favorites.move_song(1, 0).await.unwrap();
    assert_eq!(names(&favorites), vec!["S2", "S0"]);
    assert_eq!(positions(&favorites), vec![0, 1]);

    let persisted = store
        .inner
        .list_favorite_songs(favorites.user_id())
        .await
        .unwrap();
    let persisted: Vec<i32> = persisted.iter().map(|s| s.sort_order).collect();
    assert_eq!(persisted, vec![0, 1]);
}

#[tokio::test]
async fn test_add_after_gap_uses_list_length() {
    let (_store, mut favorites) = manager_with_songs(&["S0", "S1", "S2"]).await;
    let first = favorites.songs()[0].id;
    favorites.remove(first).await.unwrap();

    let added = favorites
        .add(&track("t7", "S7", "a1", "Band"))
        .await
        .unwrap();

    assert_eq!(added.sort_order, 2);
}

#[tokio::test]
async fn test_remove_unknown_id_is_not_found() {
    let (_store, mut favorites) = manager_with_songs(&["S0"]).await;

    let err = favorites.remove(9999).await.unwrap_err();

    assert!(matches!(err, Error::NotFound(_)));
    assert_eq!(favorites.songs().len(), 1);
}

#[tokio::test]
async fn test_remove_is_scoped_to_owner() {
    let (store, favorites) = manager_with_songs(&["S0"]).await;
    let intruder = store.add_user("intruder").await;
    let mut theirs = FavoritesManager::new(store.clone(), intruder);

    let err = theirs.remove(favorites.songs()[0].id).await.unwrap_err();

    assert!(matches!(err, Error::NotFound(_)));
    let still_there = store
        .inner
        .list_favorite_songs(favorites.user_id())
        .await
        .unwrap();
    assert_eq!(still_there.len(), 1);
}

#[tokio::test]
async fn test_failed_load_keeps_previous_list() {
    let (store, mut favorites) = manager_with_songs(&["S0", "S1"]).await;
    store.fail("list_favorite_songs");

    assert!(favorites.load().await.is_err());

    assert_eq!(names(&favorites), vec!["S0", "S1"]);
}

#[tokio::test]
async fn test_failed_add_leaves_list_unchanged() {
    let (store, mut favorites) = manager_with_songs(&["S0"]).await;
    store.fail("insert_favorite_song");

    assert!(favorites
        .add(&track("t5", "S5", "a1", "Band"))
        .await
        .is_err());

    assert_eq!(names(&favorites), vec!["S0"]);
}

async fn assert_dense_and_persisted(
    store: &ScriptedStore,
    favorites: &FavoritesManager<ScriptedStore>,
    expected: &[String],
    case: &str,
) {
    let dense: Vec<i32> = (0..expected.len() as i32).collect();
    assert_eq!(names(favorites), expected, "{}", case);
    assert_eq!(positions(favorites), dense, "{}", case);

    let persisted = store
        .inner
        .list_favorite_songs(favorites.user_id())
        .await
        .unwrap();
    let persisted_names: Vec<String> = persisted.iter().map(|s| s.song_name.clone()).collect();
    let persisted_positions: Vec<i32> = persisted.iter().map(|s| s.sort_order).collect();
    assert_eq!(persisted_names, expected, "{}", case);
    assert_eq!(persisted_positions, dense, "{}", case);
}

fn moved(names: &[String], from: usize, to: usize) -> Vec<String> {
    let mut expected = names.to_vec();
    let song = expected.remove(from);
    expected.insert(to, song);
    expected
}

#[tokio::test]
async fn test_every_move_leaves_dense_positions() {
    for len in 1..=5usize {
        let titles: Vec<String> = (0..len).map(|i| format!("S{}", i)).collect();
        let title_refs: Vec<&str> = titles.iter().map(String::as_str).collect();

        for from in 0..len {
            for to in 0..len {
                let (store, mut favorites) = manager_with_songs(&title_refs).await;

                favorites.move_song(from, to).await.unwrap();

                let case = format!("len {} move {} -> {}", len, from, to);
                assert_dense_and_persisted(&store, &favorites, &moved(&titles, from, to), &case)
                    .await;
            }
        }
    }
}

#[tokio::test]
async fn test_every_move_after_remove_closes_the_gap() {
    for len in 2..=5usize {
        // One extra song is removed from the middle, leaving a gap at position 1
        let titles: Vec<String> = (0..=len).map(|i| format!("S{}", i)).collect();
        let title_refs: Vec<&str> = titles.iter().map(String::as_str).collect();
        let remaining: Vec<String> = titles
            .iter()
            .filter(|t| t.as_str() != "S1")
            .cloned()
            .collect();

        for from in 0..len {
            for to in (0..len).filter(|to| *to != from) {
                let (store, mut favorites) = manager_with_songs(&title_refs).await;
                let gap = favorites.songs()[1].id;
                favorites.remove(gap).await.unwrap();
                assert_ne!(positions(&favorites), (0..len as i32).collect::<Vec<_>>());

                favorites.move_song(from, to).await.unwrap();

                let case = format!("gap, len {} move {} -> {}", len, from, to);
                assert_dense_and_persisted(&store, &favorites, &moved(&remaining, from, to), &case)
                    .await;
            }
        }
    }
}
