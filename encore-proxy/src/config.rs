//! Proxy settings
//!
//! Listener address and catalog credentials, each resolved CLI → ENV → TOML
//! on top of the shared `TomlConfig`.

use encore_common::config::{resolve_setting, TomlConfig};
use tracing::warn;

use crate::spotify::SpotifyCredentials;

/// Values supplied on the command line
#[derive(Debug, Clone, Default)]
pub struct ProxyOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
}

/// Fully resolved proxy settings
#[derive(Debug, Clone)]
pub struct ProxySettings {
    pub host: String,
    pub port: u16,
    pub credentials: Option<SpotifyCredentials>,
}

impl ProxySettings {
    pub fn resolve(config: &TomlConfig, overrides: &ProxyOverrides) -> Self {
        let host = overrides
            .host
            .clone()
            .unwrap_or_else(|| config.proxy.host.clone());
        let port = overrides.port.unwrap_or(config.proxy.port);

        let client_id = resolve_setting(
            overrides.client_id.as_deref(),
            "SPOTIFY_CLIENT_ID",
            config.spotify.client_id.as_deref(),
        );
        let client_secret = resolve_setting(
            overrides.client_secret.as_deref(),
            "SPOTIFY_CLIENT_SECRET",
            config.spotify.client_secret.as_deref(),
        );

        let credentials = match (client_id, client_secret) {
            (Some(client_id), Some(client_secret)) => Some(SpotifyCredentials {
                client_id,
                client_secret,
            }),
            (None, None) => None,
            _ => {
                warn!("Only one of the Spotify client id and secret is set; catalog search is disabled");
                None
            }
        };

        Self {
            host,
            port,
            credentials,
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        std::env::remove_var("SPOTIFY_CLIENT_ID");
        std::env::remove_var("SPOTIFY_CLIENT_SECRET");
    }

    #[test]
    #[serial]
    fn test_defaults_without_credentials() {
        clear_env();
        let settings = ProxySettings::resolve(&TomlConfig::default(), &ProxyOverrides::default());

        assert_eq!(settings.bind_address(), "127.0.0.1:5740");
        assert!(settings.credentials.is_none());
    }

    #[test]
    #[serial]
    fn test_cli_beats_env_beats_toml() {
        clear_env();
        let mut config = TomlConfig::default();
        config.spotify.client_id = Some("toml-id".into());
        config.spotify.client_secret = Some("toml-secret".into());
        std::env::set_var("SPOTIFY_CLIENT_SECRET", "env-secret");

        let overrides = ProxyOverrides {
            port: Some(8080),
            client_id: Some("cli-id".into()),
            ..Default::default()
        };
        let settings = ProxySettings::resolve(&config, &overrides);
        clear_env();

        assert_eq!(settings.port, 8080);
        assert_eq!(
            settings.credentials,
            Some(SpotifyCredentials {
                client_id: "cli-id".into(),
                client_secret: "env-secret".into(),
            })
        );
    }

    #[test]
    #[serial]
    fn test_half_configured_credentials_are_dropped() {
        clear_env();
        let mut config = TomlConfig::default();
        config.spotify.client_id = Some("id".into());

        let settings = ProxySettings::resolve(&config, &ProxyOverrides::default());

        assert!(settings.credentials.is_none());
    }
}
