//! # Encore client
//!
//! Domain logic of the Encore client over a pluggable store:
//! - Ranked favorite songs with optimistic reordering
//! - Filtered timeline with likes and comments
//! - Favorite artists, follow graph, profiles, concert log
//! - Catalog search through the proxy functions

pub mod artists;
pub mod catalog;
pub mod concerts;
pub mod favorites;
pub mod follows;
pub mod optimistic;
pub mod profile;
pub mod store;
pub mod timeline;

use std::sync::Arc;

use encore_common::config::{StoreBackend, TomlConfig};
use encore_common::{Error, Result, SessionContext};
use tracing::info;

pub use artists::ArtistsManager;
pub use catalog::CatalogClient;
pub use concerts::ConcertLog;
pub use favorites::FavoritesManager;
pub use follows::FollowGraph;
pub use profile::{ProfileOverview, ProfileService};
pub use store::{DataStore, RestStore, SqliteStore};
pub use timeline::TimelineComposer;

/// Open the store adapter selected by configuration
pub async fn open_store(
    config: &TomlConfig,
    session: Arc<SessionContext>,
) -> Result<Arc<dyn DataStore>> {
    match config.store.backend {
        StoreBackend::Rest => {
            let url = config
                .store
                .url
                .as_deref()
                .ok_or_else(|| Error::Config("store.url is required for the rest backend".to_string()))?;
            let anon_key = config.store.anon_key.as_deref().ok_or_else(|| {
                Error::Config("store.anon_key is required for the rest backend".to_string())
            })?;
            info!("Using hosted store at {}", url);
            Ok(Arc::new(RestStore::new(url, anon_key, session)?))
        }
        StoreBackend::Sqlite => {
            let path = config.database_path();
            let store = SqliteStore::open(&path).await?;
            // Local mode has no account service creating the profile row
            if let Some(current) = session.current() {
                store.ensure_profile(current.user_id, None).await?;
            }
            info!("Using local store at {}", path.display());
            Ok(Arc::new(store))
        }
    }
}
