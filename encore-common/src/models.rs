//! Domain rows shared by the store adapters and the client managers
//!
//! Field names follow the hosted backend's column names so the same types
//! serialize straight onto its REST surface.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// Authenticated user identifier
pub type UserId = Uuid;

// ========================================
// Favorite songs
// ========================================

/// One song in a user's ranked favorites
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoriteSong {
    pub id: i64,
    pub user_id: UserId,
    /// Catalog track id
    pub song_id: String,
    pub song_name: String,
    pub artist_name: String,
    #[serde(default)]
    pub album_art_url: Option<String>,
    /// 0-based rank, dense after any successful reorder
    pub sort_order: i32,
}

/// Insert payload for a favorite song
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewFavoriteSong {
    pub user_id: UserId,
    pub song_id: String,
    pub song_name: String,
    pub artist_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub album_art_url: Option<String>,
    pub sort_order: i32,
}

impl NewFavoriteSong {
    /// Same song as an existing entry (name and artist match verbatim)
    pub fn same_song_as(&self, existing: &FavoriteSong) -> bool {
        self.song_name == existing.song_name && self.artist_name == existing.artist_name
    }
}

/// One row of a batch sort-order upsert, keyed by `id`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SortPositionUpdate {
    pub id: i64,
    pub user_id: UserId,
    pub sort_order: i32,
}

// ========================================
// Favorite artists
// ========================================

/// A followed-for-filtering artist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoriteArtist {
    pub id: i64,
    pub user_id: UserId,
    /// Catalog artist id
    pub artist_id: String,
    pub artist_name: String,
    #[serde(default)]
    pub artist_image_url: Option<String>,
}

/// Insert payload for a favorite artist
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewFavoriteArtist {
    pub user_id: UserId,
    pub artist_id: String,
    pub artist_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artist_image_url: Option<String>,
}

// ========================================
// Posts, likes, comments
// ========================================

/// Song descriptor attached to a post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongAttachment {
    pub song_id: String,
    pub song_name: String,
    #[serde(default)]
    pub artist_id: Option<String>,
    pub artist_name: String,
    #[serde(default)]
    pub album_art_url: Option<String>,
}

/// A stored post row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub content: Option<String>,
    pub user_id: UserId,
    #[serde(default)]
    pub song_id: Option<String>,
    #[serde(default)]
    pub song_name: Option<String>,
    #[serde(default)]
    pub artist_id: Option<String>,
    #[serde(default)]
    pub artist_name: Option<String>,
    #[serde(default)]
    pub album_art_url: Option<String>,
}

impl Post {
    /// Attached song, if the post carries one
    pub fn song(&self) -> Option<SongAttachment> {
        match (&self.song_id, &self.song_name, &self.artist_name) {
            (Some(song_id), Some(song_name), Some(artist_name)) => Some(SongAttachment {
                song_id: song_id.clone(),
                song_name: song_name.clone(),
                artist_id: self.artist_id.clone(),
                artist_name: artist_name.clone(),
                album_art_url: self.album_art_url.clone(),
            }),
            _ => None,
        }
    }
}

/// Insert payload for a post
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewPost {
    pub user_id: UserId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(flatten)]
    pub song: Option<SongAttachment>,
}

impl NewPost {
    /// Build a post, trimming content and requiring content or a song
    pub fn new(user_id: UserId, content: &str, song: Option<SongAttachment>) -> Result<Self> {
        let content = content.trim();
        let content = (!content.is_empty()).then(|| content.to_string());
        if content.is_none() && song.is_none() {
            return Err(Error::InvalidInput(
                "A post needs text or an attached song".to_string(),
            ));
        }
        Ok(Self {
            user_id,
            content,
            song,
        })
    }
}

/// Display info of a post or comment author, joined at read time
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorSummary {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// A like as embedded in a timeline post
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LikeRef {
    pub user_id: UserId,
}

/// Stored like row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Like {
    pub post_id: i64,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
}

/// Comment joined with its author
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub content: String,
    pub user_id: UserId,
    pub post_id: i64,
    #[serde(rename = "profiles", default)]
    pub author: Option<AuthorSummary>,
}

/// Insert payload for a comment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewComment {
    pub post_id: i64,
    pub user_id: UserId,
    pub content: String,
}

impl NewComment {
    /// Build a comment, rejecting blank text
    pub fn new(post_id: i64, user_id: UserId, text: &str) -> Result<Self> {
        let content = text.trim();
        if content.is_empty() {
            return Err(Error::InvalidInput("Comment text is empty".to_string()));
        }
        Ok(Self {
            post_id,
            user_id,
            content: content.to_string(),
        })
    }
}

/// Post joined with author, like set and comments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelinePost {
    #[serde(flatten)]
    pub post: Post,
    #[serde(rename = "profiles", default)]
    pub author: Option<AuthorSummary>,
    #[serde(default)]
    pub likes: Vec<LikeRef>,
    #[serde(default)]
    pub comments: Vec<Comment>,
}

impl TimelinePost {
    pub fn is_liked_by(&self, user_id: UserId) -> bool {
        self.likes.iter().any(|like| like.user_id == user_id)
    }
}

/// Which posts the timeline asks for
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum TimelineFilter {
    #[default]
    All,
    /// Followed users plus the viewer
    Follows,
    /// Posts tagging the viewer's favorite artists or songs
    Favorites,
    /// Posts tagging one catalog artist
    Artist(String),
}

impl TimelineFilter {
    /// Discriminant sent to the timeline procedure
    pub fn kind(&self) -> &'static str {
        match self {
            TimelineFilter::All => "ALL",
            TimelineFilter::Follows => "FOLLOWS",
            TimelineFilter::Favorites => "FAVORITES",
            TimelineFilter::Artist(_) => "ARTIST",
        }
    }

    pub fn artist_id(&self) -> Option<&str> {
        match self {
            TimelineFilter::Artist(id) => Some(id),
            _ => None,
        }
    }

    /// Whether a freshly submitted post can be shown under this filter
    /// without refetching
    pub fn admits_own_posts(&self) -> bool {
        matches!(self, TimelineFilter::All | TimelineFilter::Follows)
    }
}

impl std::fmt::Display for TimelineFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimelineFilter::Artist(id) => write!(f, "artist:{}", id),
            other => f.write_str(&other.kind().to_ascii_lowercase()),
        }
    }
}

impl std::str::FromStr for TimelineFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Some(id) = s.strip_prefix("artist:") {
            if id.is_empty() {
                return Err(Error::InvalidInput("artist filter needs an id".to_string()));
            }
            return Ok(TimelineFilter::Artist(id.to_string()));
        }
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(TimelineFilter::All),
            "follows" => Ok(TimelineFilter::Follows),
            "favorites" => Ok(TimelineFilter::Favorites),
            other => Err(Error::InvalidInput(format!("Unknown timeline filter '{}'", other))),
        }
    }
}

// ========================================
// Social graph and profiles
// ========================================

/// Directed follow edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Follow {
    pub follower_id: UserId,
    pub following_id: UserId,
}

/// Entry of a followers/following listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowUser {
    pub id: UserId,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// One row per user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: UserId,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub header_url: Option<String>,
    #[serde(default)]
    pub birthday: Option<NaiveDate>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Profile {
    /// Author summary used when enriching freshly inserted rows
    pub fn author_summary(&self) -> AuthorSummary {
        AuthorSummary {
            username: self.username.clone(),
            avatar_url: self.avatar_url.clone(),
        }
    }
}

/// Partial profile update; `None` fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birthday: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        *self == ProfileUpdate::default()
    }
}

// ========================================
// Concerts
// ========================================

/// A concert the user attended, flattened with its concert row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendedConcert {
    pub concert_id: i64,
    pub user_id: UserId,
    pub event_date: NaiveDate,
    pub artist_name: String,
    pub venue_name: String,
    #[serde(default)]
    pub event_name: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Attendance to record; the concert row is found or created by the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewAttendedConcert {
    pub event_date: NaiveDate,
    pub artist_name: String,
    pub venue_name: String,
    pub event_name: Option<String>,
    pub notes: Option<String>,
}

impl NewAttendedConcert {
    /// Validate required fields and normalize blanks to `None`
    pub fn new(
        event_date: NaiveDate,
        artist_name: &str,
        venue_name: &str,
        event_name: Option<&str>,
        notes: Option<&str>,
    ) -> Result<Self> {
        let artist_name = artist_name.trim();
        let venue_name = venue_name.trim();
        if artist_name.is_empty() || venue_name.is_empty() {
            return Err(Error::InvalidInput(
                "Event date, artist name and venue name are required".to_string(),
            ));
        }
        let non_blank = |value: Option<&str>| {
            value
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };
        Ok(Self {
            event_date,
            artist_name: artist_name.to_string(),
            venue_name: venue_name.to_string(),
            event_name: non_blank(event_name),
            notes: non_blank(notes),
        })
    }
}
