//! Local database initialization
//!
//! Creates the SQLite file and the social tables on first use. Every
//! statement is idempotent, so opening an existing database is safe.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Open (creating if needed) the database file and ensure the schema
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    // WAL lets readers proceed while a batch upsert holds the write lock
    sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;
    sqlx::query("PRAGMA busy_timeout = 5000").execute(&pool).await?;

    create_schema(&pool).await?;
    Ok(pool)
}

/// Private in-memory database with the full schema (tests, scratch use)
///
/// Limited to one connection: every `sqlite::memory:` connection is its own
/// database.
pub async fn init_memory_database() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;
    create_schema(&pool).await?;
    Ok(pool)
}

/// Create all tables and indexes
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query("PRAGMA foreign_keys = ON").execute(pool).await?;

    create_profiles_table(pool).await?;
    create_posts_table(pool).await?;
    create_likes_table(pool).await?;
    create_comments_table(pool).await?;
    create_followers_table(pool).await?;
    create_favorite_songs_table(pool).await?;
    create_favorite_artists_table(pool).await?;
    create_concert_tables(pool).await?;

    Ok(())
}

async fn create_profiles_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS profiles (
            id TEXT PRIMARY KEY,
            username TEXT,
            avatar_url TEXT,
            header_url TEXT,
            birthday TEXT,
            bio TEXT,
            website TEXT,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_posts_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS posts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            created_at TEXT NOT NULL,
            content TEXT,
            user_id TEXT NOT NULL REFERENCES profiles(id),
            song_id TEXT,
            song_name TEXT,
            artist_id TEXT,
            artist_name TEXT,
            album_art_url TEXT,
            CHECK (content IS NOT NULL OR song_id IS NOT NULL)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_posts_created ON posts(created_at DESC, id DESC)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_posts_artist ON posts(artist_id)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_likes_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS likes (
            post_id INTEGER NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
            user_id TEXT NOT NULL REFERENCES profiles(id),
            created_at TEXT NOT NULL,
            PRIMARY KEY (post_id, user_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_comments_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS comments (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            created_at TEXT NOT NULL,
            content TEXT NOT NULL,
            user_id TEXT NOT NULL REFERENCES profiles(id),
            post_id INTEGER NOT NULL REFERENCES posts(id) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_comments_post ON comments(post_id, created_at)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_followers_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS followers (
            follower_id TEXT NOT NULL REFERENCES profiles(id),
            following_id TEXT NOT NULL REFERENCES profiles(id),
            created_at TEXT NOT NULL,
            PRIMARY KEY (follower_id, following_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_favorite_songs_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS favorite_songs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id TEXT NOT NULL REFERENCES profiles(id),
            song_id TEXT NOT NULL,
            song_name TEXT NOT NULL,
            artist_name TEXT NOT NULL,
            album_art_url TEXT,
            sort_order INTEGER NOT NULL DEFAULT 0,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Server-side backstop for the client's duplicate check
    sqlx::query(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_favorite_songs_unique
         ON favorite_songs(user_id, song_name, artist_name)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_favorite_artists_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS favorite_artists (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id TEXT NOT NULL REFERENCES profiles(id),
            artist_id TEXT NOT NULL,
            artist_name TEXT NOT NULL,
            artist_image_url TEXT,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            UNIQUE (user_id, artist_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_concert_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS concerts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            event_date TEXT NOT NULL,
            artist_name TEXT NOT NULL,
            venue_name TEXT NOT NULL,
            event_name TEXT,
            UNIQUE (event_date, artist_name, venue_name)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS user_attended_concerts (
            user_id TEXT NOT NULL REFERENCES profiles(id),
            concert_id INTEGER NOT NULL REFERENCES concerts(id),
            notes TEXT,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            PRIMARY KEY (user_id, concert_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
