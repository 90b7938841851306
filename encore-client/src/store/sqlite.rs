//! Local SQLite adapter
//!
//! Same table layout as the hosted backend. User ids are stored as text,
//! timestamps as fixed-width RFC 3339 text so lexical order matches time
//! order.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use encore_common::db::{init_database, init_memory_database};
use encore_common::models::{
    AttendedConcert, AuthorSummary, Comment, FavoriteArtist, FavoriteSong, Follow, FollowUser,
    LikeRef, NewAttendedConcert, NewComment, NewFavoriteArtist, NewFavoriteSong, NewPost, Post,
    Profile, ProfileUpdate, SortPositionUpdate, TimelineFilter, TimelinePost, UserId,
};
use encore_common::{Error, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use super::{ConcertStore, FavoriteArtistStore, FavoriteSongStore, PostStore, SocialStore};

const POST_COLUMNS: &str = "p.id, p.created_at, p.content, p.user_id, p.song_id, p.song_name, \
     p.artist_id, p.artist_name, p.album_art_url";

const ATTENDED_CONCERT_SELECT: &str = r#"
    SELECT u.concert_id, u.user_id, c.event_date, c.artist_name, c.venue_name,
           c.event_name, u.notes
    FROM user_attended_concerts u
    JOIN concerts c ON c.id = u.concert_id
"#;

/// Store adapter over a local SQLite pool
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (creating if needed) a database file
    pub async fn open(path: &Path) -> Result<Self> {
        Ok(Self::new(init_database(path).await?))
    }

    /// Fresh private in-memory database
    pub async fn in_memory() -> Result<Self> {
        Ok(Self::new(init_memory_database().await?))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create the profile row for a user if it does not exist yet.
    ///
    /// The hosted backend does this when the account is created; locally
    /// it has to happen before the user writes anything.
    pub async fn ensure_profile(&self, user_id: UserId, username: Option<&str>) -> Result<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO profiles (id, username, created_at)
            VALUES (?, ?, ?)
            ON CONFLICT(id) DO NOTHING
            "#,
        )
        .bind(user_id.to_string())
        .bind(username)
        .bind(format_timestamp(Utc::now()))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            debug!(user_id = %user_id, "Created local profile");
        }
        Ok(())
    }

    async fn likes_for(&self, post_ids: &[i64]) -> Result<HashMap<i64, Vec<LikeRef>>> {
        let mut grouped: HashMap<i64, Vec<LikeRef>> = HashMap::new();
        if post_ids.is_empty() {
            return Ok(grouped);
        }

        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT post_id, user_id FROM likes WHERE post_id IN (");
        let mut ids = qb.separated(", ");
        for id in post_ids {
            ids.push_bind(*id);
        }
        ids.push_unseparated(") ORDER BY created_at ASC");

        for row in qb.build().fetch_all(&self.pool).await? {
            let post_id: i64 = row.try_get("post_id")?;
            let user_id = parse_uuid(&row.try_get::<String, _>("user_id")?)?;
            grouped.entry(post_id).or_default().push(LikeRef { user_id });
        }
        Ok(grouped)
    }

    async fn comments_for(&self, post_ids: &[i64]) -> Result<HashMap<i64, Vec<Comment>>> {
        let mut grouped: HashMap<i64, Vec<Comment>> = HashMap::new();
        if post_ids.is_empty() {
            return Ok(grouped);
        }

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
            r#"
            SELECT c.id, c.created_at, c.content, c.user_id, c.post_id,
                   pr.username AS author_username, pr.avatar_url AS author_avatar
            FROM comments c
            LEFT JOIN profiles pr ON pr.id = c.user_id
            WHERE c.post_id IN (
            "#,
        );
        let mut ids = qb.separated(", ");
        for id in post_ids {
            ids.push_bind(*id);
        }
        ids.push_unseparated(") ORDER BY c.created_at ASC, c.id ASC");

        for row in qb.build().fetch_all(&self.pool).await? {
            let comment = comment_from_row(&row)?;
            grouped.entry(comment.post_id).or_default().push(comment);
        }
        Ok(grouped)
    }
}

// ========================================
// Column codecs
// ========================================

fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Accepts RFC 3339 and SQLite's `CURRENT_TIMESTAMP` format
fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .map(|naive| Utc.from_utc_datetime(&naive))
        .map_err(|e| Error::Internal(format!("Invalid timestamp '{}': {}", raw, e)))
}

fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|e| Error::Internal(format!("Invalid date '{}': {}", raw, e)))
}

fn parse_uuid(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|e| Error::Internal(format!("Invalid user id '{}': {}", raw, e)))
}

/// Constraint violations become `Conflict`; everything else stays a database error
fn map_write_error(err: sqlx::Error, what: &str) -> Error {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return Error::Conflict(format!("{} already exists", what));
        }
        if db_err.is_foreign_key_violation() {
            return Error::Conflict(format!("{} references a missing row", what));
        }
    }
    Error::Database(err)
}

fn author_from_columns(username: Option<String>, avatar_url: Option<String>) -> Option<AuthorSummary> {
    if username.is_none() && avatar_url.is_none() {
        return None;
    }
    Some(AuthorSummary {
        username,
        avatar_url,
    })
}

fn favorite_song_from_row(row: &SqliteRow) -> Result<FavoriteSong> {
    Ok(FavoriteSong {
        id: row.try_get("id")?,
        user_id: parse_uuid(&row.try_get::<String, _>("user_id")?)?,
        song_id: row.try_get("song_id")?,
        song_name: row.try_get("song_name")?,
        artist_name: row.try_get("artist_name")?,
        album_art_url: row.try_get("album_art_url")?,
        sort_order: row.try_get("sort_order")?,
    })
}

fn favorite_artist_from_row(row: &SqliteRow) -> Result<FavoriteArtist> {
    Ok(FavoriteArtist {
        id: row.try_get("id")?,
        user_id: parse_uuid(&row.try_get::<String, _>("user_id")?)?,
        artist_id: row.try_get("artist_id")?,
        artist_name: row.try_get("artist_name")?,
        artist_image_url: row.try_get("artist_image_url")?,
    })
}

fn post_from_row(row: &SqliteRow) -> Result<Post> {
    Ok(Post {
        id: row.try_get("id")?,
        created_at: parse_timestamp(&row.try_get::<String, _>("created_at")?)?,
        content: row.try_get("content")?,
        user_id: parse_uuid(&row.try_get::<String, _>("user_id")?)?,
        song_id: row.try_get("song_id")?,
        song_name: row.try_get("song_name")?,
        artist_id: row.try_get("artist_id")?,
        artist_name: row.try_get("artist_name")?,
        album_art_url: row.try_get("album_art_url")?,
    })
}

fn comment_from_row(row: &SqliteRow) -> Result<Comment> {
    Ok(Comment {
        id: row.try_get("id")?,
        created_at: parse_timestamp(&row.try_get::<String, _>("created_at")?)?,
        content: row.try_get("content")?,
        user_id: parse_uuid(&row.try_get::<String, _>("user_id")?)?,
        post_id: row.try_get("post_id")?,
        author: author_from_columns(
            row.try_get("author_username")?,
            row.try_get("author_avatar")?,
        ),
    })
}

fn follow_user_from_row(row: &SqliteRow) -> Result<FollowUser> {
    Ok(FollowUser {
        id: parse_uuid(&row.try_get::<String, _>("id")?)?,
        username: row.try_get("username")?,
        avatar_url: row.try_get("avatar_url")?,
    })
}

fn profile_from_row(row: &SqliteRow) -> Result<Profile> {
    let birthday: Option<String> = row.try_get("birthday")?;
    let created_at: Option<String> = row.try_get("created_at")?;
    let updated_at: Option<String> = row.try_get("updated_at")?;

    Ok(Profile {
        id: parse_uuid(&row.try_get::<String, _>("id")?)?,
        username: row.try_get("username")?,
        avatar_url: row.try_get("avatar_url")?,
        header_url: row.try_get("header_url")?,
        birthday: birthday.as_deref().map(parse_date).transpose()?,
        bio: row.try_get("bio")?,
        website: row.try_get("website")?,
        created_at: created_at.as_deref().map(parse_timestamp).transpose()?,
        updated_at: updated_at.as_deref().map(parse_timestamp).transpose()?,
    })
}

fn attended_concert_from_row(row: &SqliteRow) -> Result<AttendedConcert> {
    Ok(AttendedConcert {
        concert_id: row.try_get("concert_id")?,
        user_id: parse_uuid(&row.try_get::<String, _>("user_id")?)?,
        event_date: parse_date(&row.try_get::<String, _>("event_date")?)?,
        artist_name: row.try_get("artist_name")?,
        venue_name: row.try_get("venue_name")?,
        event_name: row.try_get("event_name")?,
        notes: row.try_get("notes")?,
    })
}

// ========================================
// Ports
// ========================================

#[async_trait]
impl FavoriteSongStore for SqliteStore {
    async fn list_favorite_songs(&self, user_id: UserId) -> Result<Vec<FavoriteSong>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, song_id, song_name, artist_name, album_art_url, sort_order
            FROM favorite_songs
            WHERE user_id = ?
            ORDER BY sort_order ASC, id ASC
            "#,
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(favorite_song_from_row).collect()
    }

    async fn insert_favorite_song(&self, song: &NewFavoriteSong) -> Result<FavoriteSong> {
        let row = sqlx::query(
            r#"
            INSERT INTO favorite_songs
                (user_id, song_id, song_name, artist_name, album_art_url, sort_order)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING id, user_id, song_id, song_name, artist_name, album_art_url, sort_order
            "#,
        )
        .bind(song.user_id.to_string())
        .bind(&song.song_id)
        .bind(&song.song_name)
        .bind(&song.artist_name)
        .bind(&song.album_art_url)
        .bind(song.sort_order)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "Favorite song"))?;

        favorite_song_from_row(&row)
    }

    async fn upsert_sort_positions(&self, updates: &[SortPositionUpdate]) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        for update in updates {
            let result = sqlx::query(
                "UPDATE favorite_songs SET sort_order = ? WHERE id = ? AND user_id = ?",
            )
            .bind(update.sort_order)
            .bind(update.id)
            .bind(update.user_id.to_string())
            .execute(&mut *tx)
            .await?;

            // Dropping the transaction rolls back the rows already written
            if result.rows_affected() == 0 {
                return Err(Error::NotFound(format!("Favorite song {}", update.id)));
            }
        }

        tx.commit().await?;
        debug!(rows = updates.len(), "Upserted sort positions");
        Ok(())
    }

    async fn delete_favorite_song(&self, user_id: UserId, id: i64) -> Result<u64> {
        let result = sqlx::query("DELETE FROM favorite_songs WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl FavoriteArtistStore for SqliteStore {
    async fn list_favorite_artists(&self, user_id: UserId) -> Result<Vec<FavoriteArtist>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, artist_id, artist_name, artist_image_url
            FROM favorite_artists
            WHERE user_id = ?
            ORDER BY id ASC
            "#,
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(favorite_artist_from_row).collect()
    }

    async fn insert_favorite_artist(&self, artist: &NewFavoriteArtist) -> Result<FavoriteArtist> {
        let row = sqlx::query(
            r#"
            INSERT INTO favorite_artists (user_id, artist_id, artist_name, artist_image_url)
            VALUES (?, ?, ?, ?)
            RETURNING id, user_id, artist_id, artist_name, artist_image_url
            "#,
        )
        .bind(artist.user_id.to_string())
        .bind(&artist.artist_id)
        .bind(&artist.artist_name)
        .bind(&artist.artist_image_url)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "Favorite artist"))?;

        favorite_artist_from_row(&row)
    }

    async fn delete_favorite_artist(&self, user_id: UserId, id: i64) -> Result<u64> {
        let result = sqlx::query("DELETE FROM favorite_artists WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl PostStore for SqliteStore {
    async fn fetch_timeline(
        &self,
        viewer: UserId,
        filter: &TimelineFilter,
    ) -> Result<Vec<TimelinePost>> {
        let sql = format!(
            r#"
            SELECT {POST_COLUMNS},
                   pr.username AS author_username, pr.avatar_url AS author_avatar
            FROM posts p
            LEFT JOIN profiles pr ON pr.id = p.user_id
            WHERE CASE ?1
                WHEN 'ALL' THEN 1
                WHEN 'FOLLOWS' THEN
                    p.user_id = ?2
                    OR p.user_id IN (SELECT following_id FROM followers WHERE follower_id = ?2)
                WHEN 'FAVORITES' THEN
                    p.artist_id IN (SELECT artist_id FROM favorite_artists WHERE user_id = ?2)
                    OR p.song_id IN (SELECT song_id FROM favorite_songs WHERE user_id = ?2)
                WHEN 'ARTIST' THEN p.artist_id = ?3
                ELSE 0
            END
            ORDER BY p.created_at DESC, p.id DESC
            "#
        );

        let rows = sqlx::query(&sql)
            .bind(filter.kind())
            .bind(viewer.to_string())
            .bind(filter.artist_id())
            .fetch_all(&self.pool)
            .await?;

        let mut posts = Vec::with_capacity(rows.len());
        for row in &rows {
            posts.push((
                post_from_row(row)?,
                author_from_columns(row.try_get("author_username")?, row.try_get("author_avatar")?),
            ));
        }

        let ids: Vec<i64> = posts.iter().map(|(post, _)| post.id).collect();
        let mut likes = self.likes_for(&ids).await?;
        let mut comments = self.comments_for(&ids).await?;

        Ok(posts
            .into_iter()
            .map(|(post, author)| TimelinePost {
                likes: likes.remove(&post.id).unwrap_or_default(),
                comments: comments.remove(&post.id).unwrap_or_default(),
                post,
                author,
            })
            .collect())
    }

    async fn insert_post(&self, post: &NewPost) -> Result<Post> {
        let song = post.song.as_ref();
        let sql = format!(
            r#"
            INSERT INTO posts
                (created_at, content, user_id, song_id, song_name, artist_id, artist_name, album_art_url)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING {}
            "#,
            POST_COLUMNS.replace("p.", "")
        );

        let row = sqlx::query(&sql)
            .bind(format_timestamp(Utc::now()))
            .bind(&post.content)
            .bind(post.user_id.to_string())
            .bind(song.map(|s| s.song_id.clone()))
            .bind(song.map(|s| s.song_name.clone()))
            .bind(song.and_then(|s| s.artist_id.clone()))
            .bind(song.map(|s| s.artist_name.clone()))
            .bind(song.and_then(|s| s.album_art_url.clone()))
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_write_error(e, "Post"))?;

        post_from_row(&row)
    }

    async fn insert_like(&self, post_id: i64, user_id: UserId) -> Result<()> {
        sqlx::query("INSERT INTO likes (post_id, user_id, created_at) VALUES (?, ?, ?)")
            .bind(post_id)
            .bind(user_id.to_string())
            .bind(format_timestamp(Utc::now()))
            .execute(&self.pool)
            .await
            .map_err(|e| map_write_error(e, "Like"))?;
        Ok(())
    }

    async fn delete_like(&self, post_id: i64, user_id: UserId) -> Result<()> {
        sqlx::query("DELETE FROM likes WHERE post_id = ? AND user_id = ?")
            .bind(post_id)
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn insert_comment(&self, comment: &NewComment) -> Result<Comment> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO comments (created_at, content, user_id, post_id)
            VALUES (?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(format_timestamp(Utc::now()))
        .bind(&comment.content)
        .bind(comment.user_id.to_string())
        .bind(comment.post_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "Comment"))?;

        let row = sqlx::query(
            r#"
            SELECT c.id, c.created_at, c.content, c.user_id, c.post_id,
                   pr.username AS author_username, pr.avatar_url AS author_avatar
            FROM comments c
            LEFT JOIN profiles pr ON pr.id = c.user_id
            WHERE c.id = ?
            "#,
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        comment_from_row(&row)
    }
}

#[async_trait]
impl SocialStore for SqliteStore {
    async fn is_following(&self, follow: &Follow) -> Result<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM followers WHERE follower_id = ? AND following_id = ?",
        )
        .bind(follow.follower_id.to_string())
        .bind(follow.following_id.to_string())
        .fetch_one(&self.pool)
        .await?;
        Ok(count > 0)
    }

    async fn insert_follow(&self, follow: &Follow) -> Result<()> {
        sqlx::query("INSERT INTO followers (follower_id, following_id, created_at) VALUES (?, ?, ?)")
            .bind(follow.follower_id.to_string())
            .bind(follow.following_id.to_string())
            .bind(format_timestamp(Utc::now()))
            .execute(&self.pool)
            .await
            .map_err(|e| map_write_error(e, "Follow"))?;
        Ok(())
    }

    async fn delete_follow(&self, follow: &Follow) -> Result<()> {
        sqlx::query("DELETE FROM followers WHERE follower_id = ? AND following_id = ?")
            .bind(follow.follower_id.to_string())
            .bind(follow.following_id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_followers(&self, user_id: UserId) -> Result<Vec<FollowUser>> {
        let rows = sqlx::query(
            r#"
            SELECT pr.id, pr.username, pr.avatar_url
            FROM followers f
            JOIN profiles pr ON pr.id = f.follower_id
            WHERE f.following_id = ?
            ORDER BY f.created_at DESC
            "#,
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(follow_user_from_row).collect()
    }

    async fn list_following(&self, user_id: UserId) -> Result<Vec<FollowUser>> {
        let rows = sqlx::query(
            r#"
            SELECT pr.id, pr.username, pr.avatar_url
            FROM followers f
            JOIN profiles pr ON pr.id = f.following_id
            WHERE f.follower_id = ?
            ORDER BY f.created_at DESC
            "#,
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(follow_user_from_row).collect()
    }

    async fn get_profile(&self, user_id: UserId) -> Result<Option<Profile>> {
        let row = sqlx::query(
            r#"
            SELECT id, username, avatar_url, header_url, birthday, bio, website,
                   created_at, updated_at
            FROM profiles
            WHERE id = ?
            "#,
        )
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(profile_from_row).transpose()
    }

    async fn update_profile(&self, user_id: UserId, update: &ProfileUpdate) -> Result<Profile> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE profiles SET updated_at = ");
        qb.push_bind(format_timestamp(Utc::now()));

        if let Some(username) = &update.username {
            qb.push(", username = ").push_bind(username.clone());
        }
        if let Some(birthday) = update.birthday {
            qb.push(", birthday = ").push_bind(format_date(birthday));
        }
        if let Some(bio) = &update.bio {
            qb.push(", bio = ").push_bind(bio.clone());
        }
        if let Some(avatar_url) = &update.avatar_url {
            qb.push(", avatar_url = ").push_bind(avatar_url.clone());
        }
        if let Some(header_url) = &update.header_url {
            qb.push(", header_url = ").push_bind(header_url.clone());
        }
        if let Some(website) = &update.website {
            qb.push(", website = ").push_bind(website.clone());
        }
        qb.push(" WHERE id = ").push_bind(user_id.to_string());

        let result = qb
            .build()
            .execute(&self.pool)
            .await
            .map_err(|e| map_write_error(e, "Profile"))?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("Profile {}", user_id)));
        }

        self.get_profile(user_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Profile {}", user_id)))
    }
}

#[async_trait]
impl ConcertStore for SqliteStore {
    async fn add_attended_concert(
        &self,
        user_id: UserId,
        concert: &NewAttendedConcert,
    ) -> Result<AttendedConcert> {
        let mut tx = self.pool.begin().await?;

        // Reuse the concert row when (date, artist, venue) already exists
        let concert_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO concerts (event_date, artist_name, venue_name, event_name)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(event_date, artist_name, venue_name)
            DO UPDATE SET event_name = COALESCE(concerts.event_name, excluded.event_name)
            RETURNING id
            "#,
        )
        .bind(format_date(concert.event_date))
        .bind(&concert.artist_name)
        .bind(&concert.venue_name)
        .bind(&concert.event_name)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO user_attended_concerts (user_id, concert_id, notes)
            VALUES (?, ?, ?)
            ON CONFLICT(user_id, concert_id)
            DO UPDATE SET notes = COALESCE(excluded.notes, user_attended_concerts.notes)
            "#,
        )
        .bind(user_id.to_string())
        .bind(concert_id)
        .bind(&concert.notes)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_write_error(e, "Attended concert"))?;

        let sql = format!("{} WHERE u.user_id = ? AND u.concert_id = ?", ATTENDED_CONCERT_SELECT);
        let row = sqlx::query(&sql)
            .bind(user_id.to_string())
            .bind(concert_id)
            .fetch_one(&mut *tx)
            .await?;
        let attended = attended_concert_from_row(&row)?;

        tx.commit().await?;
        Ok(attended)
    }

    async fn list_attended_concerts(&self, user_id: UserId) -> Result<Vec<AttendedConcert>> {
        let sql = format!(
            "{} WHERE u.user_id = ? ORDER BY c.event_date DESC, c.id DESC",
            ATTENDED_CONCERT_SELECT
        );
        let rows = sqlx::query(&sql)
            .bind(user_id.to_string())
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(attended_concert_from_row).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamps_sort_lexically() {
        let earlier = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
        let later = earlier + chrono::Duration::milliseconds(5);
        assert!(format_timestamp(earlier) < format_timestamp(later));
        assert_eq!(format_timestamp(earlier).len(), format_timestamp(later).len());
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let ts = parse_timestamp("2024-03-05T07:08:09.000123Z").unwrap();
        assert_eq!(format_timestamp(ts), "2024-03-05T07:08:09.000123Z");

        let ts = parse_timestamp("2024-03-05 07:08:09").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2024, 3, 5, 7, 8, 9).unwrap());

        assert!(parse_timestamp("yesterday").is_err());
    }

    #[test]
    fn test_date_codec() {
        let date = NaiveDate::from_ymd_opt(1999, 12, 31).unwrap();
        assert_eq!(parse_date(&format_date(date)).unwrap(), date);
    }
}
