//! Catalog search and music-link types shared by the proxy and the client
//!
//! The search types mirror the subset of the catalog provider's search
//! response that Encore reads. Unknown fields are ignored so the proxy can
//! pass the provider response through untouched.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};

use crate::models::{NewFavoriteArtist, NewFavoriteSong, SongAttachment, UserId};

/// Characters `encodeURIComponent` escapes: everything except
/// `A-Z a-z 0-9 - _ . ! ~ * ' ( )`
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

const SPOTIFY_SEARCH_URL: &str = "https://open.spotify.com/search/";
const YOUTUBE_MUSIC_SEARCH_URL: &str = "https://music.youtube.com/search?q=";
const APPLE_MUSIC_SEARCH_URL: &str = "https://music.apple.com/search?term=";

/// What a catalog search looks for
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchKind {
    #[default]
    Track,
    Artist,
}

impl SearchKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchKind::Track => "track",
            SearchKind::Artist => "artist",
        }
    }
}

/// Body of `POST spotify-search`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<SearchKind>,
}

/// Body of `POST music-link-generator`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MusicLinkRequest {
    #[serde(default)]
    pub song_name: Option<String>,
    #[serde(default)]
    pub artist_name: Option<String>,
}

/// Search URLs for one song on each streaming provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MusicLinks {
    pub spotify: String,
    #[serde(rename = "youtubeMusic")]
    pub youtube_music: String,
    #[serde(rename = "appleMusic")]
    pub apple_music: String,
}

impl MusicLinks {
    /// Build provider search links for `"<song> <artist>"`.
    ///
    /// No existence check is made against the providers.
    pub fn for_song(song_name: &str, artist_name: &str) -> Self {
        let term = encode_uri_component(&format!("{} {}", song_name, artist_name));
        Self {
            spotify: format!("{}{}", SPOTIFY_SEARCH_URL, term),
            youtube_music: format!("{}{}", YOUTUBE_MUSIC_SEARCH_URL, term),
            apple_music: format!("{}{}", APPLE_MUSIC_SEARCH_URL, term),
        }
    }
}

/// Percent-encode like JavaScript's `encodeURIComponent`
pub fn encode_uri_component(value: &str) -> String {
    utf8_percent_encode(value, URI_COMPONENT).to_string()
}

// ========================================
// Provider search response
// ========================================

/// Search response keyed by item collection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResults {
    #[serde(default)]
    pub tracks: Option<Paging<CatalogTrack>>,
    #[serde(default)]
    pub artists: Option<Paging<CatalogArtist>>,
}

impl SearchResults {
    pub fn track_items(&self) -> &[CatalogTrack] {
        self.tracks.as_ref().map(|p| p.items.as_slice()).unwrap_or(&[])
    }

    pub fn artist_items(&self) -> &[CatalogArtist] {
        self.artists.as_ref().map(|p| p.items.as_slice()).unwrap_or(&[])
    }
}

/// One page of results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paging<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    #[serde(default)]
    pub total: Option<u64>,
}

/// Artwork or portrait
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogImage {
    pub url: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

/// Artist as credited on a track
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtistRef {
    pub id: String,
    pub name: String,
}

/// Album a track appears on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogAlbum {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub images: Vec<CatalogImage>,
}

/// Track search hit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogTrack {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub artists: Vec<ArtistRef>,
    #[serde(default)]
    pub album: Option<CatalogAlbum>,
}

impl CatalogTrack {
    /// Credited artists joined with ", "
    pub fn artist_display(&self) -> String {
        self.artists
            .iter()
            .map(|a| a.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// First album image, if any
    pub fn artwork_url(&self) -> Option<String> {
        self.album
            .as_ref()
            .and_then(|album| album.images.first())
            .map(|image| image.url.clone())
    }

    /// Favorite-song candidate at `sort_order`
    pub fn to_favorite(&self, user_id: UserId, sort_order: i32) -> NewFavoriteSong {
        NewFavoriteSong {
            user_id,
            song_id: self.id.clone(),
            song_name: self.name.clone(),
            artist_name: self.artist_display(),
            album_art_url: self.artwork_url(),
            sort_order,
        }
    }

    /// Descriptor for attaching this track to a post
    pub fn to_attachment(&self) -> SongAttachment {
        SongAttachment {
            song_id: self.id.clone(),
            song_name: self.name.clone(),
            artist_id: self.artists.first().map(|a| a.id.clone()),
            artist_name: self.artist_display(),
            album_art_url: self.artwork_url(),
        }
    }
}

/// Artist search hit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogArtist {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub images: Vec<CatalogImage>,
}

impl CatalogArtist {
    pub fn to_favorite(&self, user_id: UserId) -> NewFavoriteArtist {
        NewFavoriteArtist {
            user_id,
            artist_id: self.id.clone(),
            artist_name: self.name.clone(),
            artist_image_url: self.images.first().map(|image| image.url.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_links_encode_like_uri_component() {
        let links = MusicLinks::for_song("Don't Stop Me Now", "Queen");
        assert_eq!(
            links.spotify,
            "https://open.spotify.com/search/Don't%20Stop%20Me%20Now%20Queen"
        );
        assert_eq!(
            links.youtube_music,
            "https://music.youtube.com/search?q=Don't%20Stop%20Me%20Now%20Queen"
        );
        assert_eq!(
            links.apple_music,
            "https://music.apple.com/search?term=Don't%20Stop%20Me%20Now%20Queen"
        );
    }

    #[test]
    fn test_encode_reserved_and_unicode() {
        assert_eq!(encode_uri_component("a&b=c/d?"), "a%26b%3Dc%2Fd%3F");
        assert_eq!(encode_uri_component("(x)*!~"), "(x)*!~");
        assert_eq!(encode_uri_component("夜に駆ける"), "%E5%A4%9C%E3%81%AB%E9%A7%86%E3%81%91%E3%82%8B");
    }

    #[test]
    fn test_links_serialize_camel_case_keys() {
        let json = serde_json::to_value(MusicLinks::for_song("a", "b")).unwrap();
        assert!(json.get("youtubeMusic").is_some());
        assert!(json.get("appleMusic").is_some());
        assert!(json.get("spotify").is_some());
    }

    #[test]
    fn test_search_request_type_defaults() {
        let req: SearchRequest = serde_json::from_str(r#"{"query":"yoasobi"}"#).unwrap();
        assert_eq!(req.kind.unwrap_or_default(), SearchKind::Track);
        let req: SearchRequest =
            serde_json::from_str(r#"{"query":"yoasobi","type":"artist"}"#).unwrap();
        assert_eq!(req.kind, Some(SearchKind::Artist));
    }

    #[test]
    fn test_track_to_favorite_joins_artists() {
        let json = serde_json::json!({
            "tracks": {
                "items": [{
                    "id": "t1",
                    "name": "Idol",
                    "artists": [{"id": "a1", "name": "YOASOBI"}, {"id": "a2", "name": "Guest"}],
                    "album": {"images": [{"url": "https://img/1"}, {"url": "https://img/2"}]},
                    "popularity": 90
                }],
                "total": 1
            }
        });
        let results: SearchResults = serde_json::from_value(json).unwrap();
        let track = &results.track_items()[0];
        let user = Uuid::new_v4();
        let fav = track.to_favorite(user, 3);
        assert_eq!(fav.artist_name, "YOASOBI, Guest");
        assert_eq!(fav.album_art_url.as_deref(), Some("https://img/1"));
        assert_eq!(fav.sort_order, 3);
        assert_eq!(track.to_attachment().artist_id.as_deref(), Some("a1"));
        assert!(results.artist_items().is_empty());
    }
}
