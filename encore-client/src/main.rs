//! encore - command-line front end for the Encore client library
//!
//! Resolves configuration (CLI > environment > config file > defaults),
//! opens the configured store and runs one command against it. Results are
//! printed as JSON on stdout; logs go to stderr.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use encore_client::{
    open_store, ArtistsManager, CatalogClient, ConcertLog, DataStore, FavoritesManager,
    FollowGraph, ProfileService, TimelineComposer,
};
use encore_common::config::TomlConfig;
use encore_common::models::{NewAttendedConcert, ProfileUpdate, TimelineFilter};
use encore_common::{Session, SessionContext};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

/// Command-line arguments for encore
#[derive(Parser, Debug)]
#[command(name = "encore")]
#[command(about = "Encore music social network client")]
#[command(version)]
struct Args {
    /// Config file (default: ~/.config/encore/config.toml)
    #[arg(long, global = true, env = "ENCORE_CONFIG")]
    config: Option<PathBuf>,

    /// Store backend: rest or sqlite
    #[arg(long, global = true)]
    backend: Option<String>,

    /// Hosted backend base URL
    #[arg(long, global = true)]
    store_url: Option<String>,

    /// Local database file (sqlite backend)
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    /// Base URL of the catalog proxy functions
    #[arg(long, global = true)]
    functions_url: Option<String>,

    /// Signed-in user id
    #[arg(long, global = true, env = "ENCORE_USER_ID")]
    user: Option<Uuid>,

    /// Access token of the signed-in user
    #[arg(long, global = true, env = "ENCORE_ACCESS_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Ranked favorite songs
    #[command(subcommand)]
    Favorites(FavoritesCommand),

    /// Favorite artists
    #[command(subcommand)]
    Artists(ArtistsCommand),

    /// Show the timeline (all, follows, favorites, artist:<id>)
    Timeline {
        #[arg(long, default_value = "all")]
        filter: String,
    },

    /// Publish a post, optionally tagging the first track matching --song
    Post {
        #[arg(default_value = "")]
        text: String,
        #[arg(long)]
        song: Option<String>,
    },

    /// Like a post (or unlike with --unlike)
    Like {
        post_id: i64,
        #[arg(long)]
        unlike: bool,
    },

    /// Comment on a post
    Comment { post_id: i64, text: String },

    Follow { user: Uuid },

    Unfollow { user: Uuid },

    /// Followers of a user (default: yourself)
    Followers { user: Option<Uuid> },

    /// Users a user follows (default: yourself)
    Following { user: Option<Uuid> },

    #[command(subcommand)]
    Profile(ProfileCommand),

    #[command(subcommand)]
    Concerts(ConcertsCommand),

    /// Search the catalog
    Search {
        query: String,
        #[arg(long)]
        artists: bool,
    },

    /// Streaming-provider links for a song
    Links { song: String, artist: String },
}

#[derive(Subcommand, Debug)]
enum FavoritesCommand {
    List,
    /// Add the first track matching a search
    Add { query: String },
    /// Move the song at one position to another (0-based)
    Move { from: usize, to: usize },
    Remove { id: i64 },
}

#[derive(Subcommand, Debug)]
enum ArtistsCommand {
    List,
    /// Add the first artist matching a search
    Add { query: String },
    Remove { id: i64 },
}

#[derive(Subcommand, Debug)]
enum ProfileCommand {
    Show { user: Option<Uuid> },
    /// Profile with favorites, concerts and follow counts
    Overview { user: Option<Uuid> },
    /// Edit your profile
    Set {
        #[arg(long)]
        username: String,
        #[arg(long)]
        bio: Option<String>,
        #[arg(long)]
        birthday: Option<NaiveDate>,
        #[arg(long)]
        website: Option<String>,
        #[arg(long)]
        avatar_url: Option<String>,
        #[arg(long)]
        header_url: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
enum ConcertsCommand {
    List,
    Add {
        #[arg(long)]
        date: NaiveDate,
        #[arg(long)]
        artist: String,
        #[arg(long)]
        venue: String,
        #[arg(long)]
        event: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = TomlConfig::resolve(args.config.as_deref())?;
    apply_cli_overrides(&mut config, &args)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level)),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("encore v{}", env!("CARGO_PKG_VERSION"));

    let session = SessionContext::with_session(args.user.map(|user_id| Session {
        user_id,
        access_token: args.token.clone().unwrap_or_default(),
        email: None,
    }));

    match args.command {
        Command::Search { query, artists } => {
            let catalog = catalog_client(&config)?;
            if artists {
                print_json(&catalog.search_artists(&query).await?)
            } else {
                print_json(&catalog.search_tracks(&query).await?)
            }
        }
        Command::Links { song, artist } => {
            let catalog = catalog_client(&config)?;
            print_json(&catalog.music_links(&song, &artist).await?)
        }
        command => {
            let store = open_store(&config, session.clone())
                .await
                .context("Failed to open store")?;
            run(command, store, &session, &config).await
        }
    }
}

/// CLI flags win over environment and file values
fn apply_cli_overrides(config: &mut TomlConfig, args: &Args) -> Result<()> {
    if let Some(backend) = &args.backend {
        config.store.backend = backend.parse()?;
    }
    if let Some(url) = &args.store_url {
        config.store.url = Some(url.clone());
    }
    if let Some(path) = &args.database {
        config.store.database_path = Some(path.clone());
    }
    if let Some(url) = &args.functions_url {
        config.catalog.functions_url = Some(url.clone());
    }
    Ok(())
}

fn catalog_client(config: &TomlConfig) -> Result<CatalogClient> {
    let functions_url = config
        .functions_url()
        .ok_or_else(|| anyhow!("No catalog functions URL configured (--functions-url)"))?;
    Ok(CatalogClient::new(
        &functions_url,
        config.store.anon_key.clone(),
    )?)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(
    command: Command,
    store: Arc<dyn DataStore>,
    session: &Arc<SessionContext>,
    config: &TomlConfig,
) -> Result<()> {
    match command {
        Command::Favorites(cmd) => {
            let mut favorites = FavoritesManager::new(store, session.require_user()?);
            favorites.load().await?;
            match cmd {
                FavoritesCommand::List => {}
                FavoritesCommand::Add { query } => {
                    let tracks = catalog_client(config)?.search_tracks(&query).await?;
                    let track = tracks
                        .first()
                        .ok_or_else(|| anyhow!("No track matches '{}'", query))?;
                    favorites.add(track).await?;
                }
                FavoritesCommand::Move { from, to } => favorites.move_song(from, to).await?,
                FavoritesCommand::Remove { id } => favorites.remove(id).await?,
            }
            print_json(favorites.songs())
        }
        Command::Artists(cmd) => {
            let mut artists = ArtistsManager::new(store, session.require_user()?);
            artists.load().await?;
            match cmd {
                ArtistsCommand::List => {}
                ArtistsCommand::Add { query } => {
                    let found = catalog_client(config)?.search_artists(&query).await?;
                    let artist = found
                        .first()
                        .ok_or_else(|| anyhow!("No artist matches '{}'", query))?;
                    artists.add(artist).await?;
                }
                ArtistsCommand::Remove { id } => artists.remove(id).await?,
            }
            print_json(artists.artists())
        }
        Command::Timeline { filter } => {
            let filter: TimelineFilter = filter.parse()?;
            let mut timeline = TimelineComposer::new(store, session.require_user()?);
            print_json(timeline.set_filter(filter).await?)
        }
        Command::Post { text, song } => {
            let viewer = session.require_user()?;
            let attachment = match song {
                Some(query) => {
                    let tracks = catalog_client(config)?.search_tracks(&query).await?;
                    let track = tracks
                        .first()
                        .ok_or_else(|| anyhow!("No track matches '{}'", query))?;
                    Some(track.to_attachment())
                }
                None => None,
            };

            let profiles = ProfileService::new(store.clone());
            let mut timeline = TimelineComposer::new(store, viewer);
            if let Some(profile) = profiles.load(viewer).await? {
                timeline.set_author(profile.author_summary());
            }
            timeline.submit_post(&text, attachment).await?;
            print_json(&timeline.posts().first())
        }
        Command::Like { post_id, unlike } => {
            let mut timeline = TimelineComposer::new(store, session.require_user()?);
            timeline.fetch().await?;
            timeline.toggle_like(post_id, unlike).await?;
            print_json(&timeline.posts().iter().find(|p| p.post.id == post_id))
        }
        Command::Comment { post_id, text } => {
            let mut timeline = TimelineComposer::new(store, session.require_user()?);
            print_json(&timeline.add_comment(post_id, &text).await?)
        }
        Command::Follow { user } => {
            FollowGraph::new(store)
                .follow(session.require_user()?, user)
                .await?;
            Ok(())
        }
        Command::Unfollow { user } => {
            FollowGraph::new(store)
                .unfollow(session.require_user()?, user)
                .await?;
            Ok(())
        }
        Command::Followers { user } => {
            let user = user.map(Ok).unwrap_or_else(|| session.require_user())?;
            print_json(&FollowGraph::new(store).followers(user).await?)
        }
        Command::Following { user } => {
            let user = user.map(Ok).unwrap_or_else(|| session.require_user())?;
            print_json(&FollowGraph::new(store).following(user).await?)
        }
        Command::Profile(cmd) => {
            let profiles = ProfileService::new(store);
            match cmd {
                ProfileCommand::Show { user } => {
                    let user = user.map(Ok).unwrap_or_else(|| session.require_user())?;
                    print_json(&profiles.load(user).await?)
                }
                ProfileCommand::Overview { user } => {
                    let user = user.map(Ok).unwrap_or_else(|| session.require_user())?;
                    print_json(&profiles.overview(user).await?)
                }
                ProfileCommand::Set {
                    username,
                    bio,
                    birthday,
                    website,
                    avatar_url,
                    header_url,
                } => {
                    let changes = ProfileUpdate {
                        username: Some(username),
                        birthday,
                        bio,
                        avatar_url,
                        header_url,
                        website,
                    };
                    print_json(&profiles.update(session.require_user()?, changes).await?)
                }
            }
        }
        Command::Concerts(cmd) => {
            let log = ConcertLog::new(store);
            let user = session.require_user()?;
            match cmd {
                ConcertsCommand::List => print_json(&log.list(user).await?),
                ConcertsCommand::Add {
                    date,
                    artist,
                    venue,
                    event,
                    notes,
                } => {
                    let concert = NewAttendedConcert::new(
                        date,
                        &artist,
                        &venue,
                        event.as_deref(),
                        notes.as_deref(),
                    )?;
                    print_json(&log.add(user, &concert).await?)
                }
            }
        }
        Command::Search { .. } | Command::Links { .. } => Ok(()),
    }
}
