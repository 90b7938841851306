//! Configuration loading and resolution
//!
//! Settings come from four sources, highest priority first:
//! 1. Command-line argument
//! 2. Environment variable (`ENCORE_*`, `SPOTIFY_*`)
//! 3. TOML config file (`~/.config/encore/config.toml`)
//! 4. Compiled default
//!
//! A missing config file is not an error: a warning is logged and defaults
//! are used. A config file that exists but cannot be parsed is an error.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Default port for the catalog proxy service
pub const DEFAULT_PROXY_PORT: u16 = 5740;

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub catalog: CatalogConfig,

    #[serde(default)]
    pub spotify: SpotifyConfig,

    #[serde(default)]
    pub proxy: ProxyConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Which store adapter the client talks to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Hosted backend over its REST surface
    Rest,
    /// Local SQLite file
    #[default]
    Sqlite,
}

impl std::str::FromStr for StoreBackend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rest" => Ok(StoreBackend::Rest),
            "sqlite" => Ok(StoreBackend::Sqlite),
            other => Err(Error::Config(format!(
                "Unknown store backend '{}' (expected 'rest' or 'sqlite')",
                other
            ))),
        }
    }
}

/// Remote data store settings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,

    /// Base URL of the hosted backend (e.g. `https://xyz.example.co`)
    #[serde(default)]
    pub url: Option<String>,

    /// Public (anonymous) API key sent with every request
    #[serde(default)]
    pub anon_key: Option<String>,

    /// SQLite file for the local backend
    #[serde(default)]
    pub database_path: Option<PathBuf>,
}

/// Catalog proxy location as seen by the client
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogConfig {
    /// Base URL the proxy functions are mounted under.
    /// Defaults to `<store.url>/functions/v1`.
    #[serde(default)]
    pub functions_url: Option<String>,
}

/// Catalog provider credentials (proxy side only)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SpotifyConfig {
    #[serde(default)]
    pub client_id: Option<String>,

    #[serde(default)]
    pub client_secret: Option<String>,
}

/// Proxy listener settings
#[derive(Debug, Clone, Deserialize)]
pub struct ProxyConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    DEFAULT_PROXY_PORT
}

fn default_log_level() -> String {
    "info".to_string()
}

impl TomlConfig {
    /// Parse a config document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
    }

    /// Load configuration.
    ///
    /// An explicit path must exist. Without one the platform default is
    /// tried, and its absence falls back to compiled defaults.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit_path {
            let content = std::fs::read_to_string(path).map_err(|e| {
                Error::Config(format!("Read config {} failed: {}", path.display(), e))
            })?;
            info!("Loaded configuration from {}", path.display());
            return Self::from_toml_str(&content);
        }

        match default_config_path() {
            Some(path) if path.exists() => {
                let content = std::fs::read_to_string(&path)?;
                info!("Loaded configuration from {}", path.display());
                Self::from_toml_str(&content)
            }
            Some(path) => {
                warn!(
                    "No config file at {}, using built-in defaults",
                    path.display()
                );
                Ok(Self::default())
            }
            None => {
                warn!("Could not determine config directory, using built-in defaults");
                Ok(Self::default())
            }
        }
    }

    /// Overlay `ENCORE_*` / `SPOTIFY_*` environment variables
    pub fn apply_env(&mut self) -> Result<()> {
        if let Some(backend) = env_value("ENCORE_STORE_BACKEND") {
            self.store.backend = backend.parse()?;
        }
        if let Some(url) = env_value("ENCORE_STORE_URL") {
            self.store.url = Some(url);
        }
        if let Some(key) = env_value("ENCORE_ANON_KEY") {
            self.store.anon_key = Some(key);
        }
        if let Some(path) = env_value("ENCORE_DATABASE_PATH") {
            self.store.database_path = Some(PathBuf::from(path));
        }
        if let Some(url) = env_value("ENCORE_FUNCTIONS_URL") {
            self.catalog.functions_url = Some(url);
        }
        if let Some(id) = env_value("SPOTIFY_CLIENT_ID") {
            self.spotify.client_id = Some(id);
        }
        if let Some(secret) = env_value("SPOTIFY_CLIENT_SECRET") {
            self.spotify.client_secret = Some(secret);
        }
        if let Some(port) = env_value("ENCORE_PROXY_PORT") {
            self.proxy.port = port
                .parse()
                .map_err(|e| Error::Config(format!("Invalid ENCORE_PROXY_PORT '{}': {}", port, e)))?;
        }
        if let Some(level) = env_value("ENCORE_LOG_LEVEL") {
            self.logging.level = level;
        }
        Ok(())
    }

    /// Load from file, then overlay the environment
    pub fn resolve(explicit_path: Option<&Path>) -> Result<Self> {
        let mut config = Self::load(explicit_path)?;
        config.apply_env()?;
        Ok(config)
    }

    /// Where the proxy functions live, derived from the store URL if unset
    pub fn functions_url(&self) -> Option<String> {
        self.catalog.functions_url.clone().or_else(|| {
            self.store
                .url
                .as_ref()
                .map(|base| format!("{}/functions/v1", base.trim_end_matches('/')))
        })
    }

    /// SQLite path for the local backend
    pub fn database_path(&self) -> PathBuf {
        self.store
            .database_path
            .clone()
            .unwrap_or_else(default_database_path)
    }
}

/// Resolve one setting by priority: CLI → ENV → TOML
pub fn resolve_setting(
    cli_arg: Option<&str>,
    env_var_name: &str,
    toml_value: Option<&str>,
) -> Option<String> {
    if let Some(value) = cli_arg {
        return Some(value.to_string());
    }
    if let Some(value) = env_value(env_var_name) {
        return Some(value);
    }
    toml_value.map(str::to_string)
}

/// Non-empty environment variable value
fn env_value(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
}

/// Platform config file path (`~/.config/encore/config.toml` on Linux)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("encore").join("config.toml"))
}

/// OS-dependent default database location
pub fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("encore").join("encore.db"))
        .unwrap_or_else(|| PathBuf::from("./encore_data/encore.db"))
}
