use std::path::{Path, PathBuf};
use std::time::Duration;

use color_eyre::eyre::{Context, Result, eyre};
use serde::Deserialize;
use url::Url;

use crate::services::playlist_sync::accounts::AccountSettings;
use crate::services::playlist_sync::mirror_name::SyncMarkers;

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub accounts: AccountSettings,
    #[serde(default)]
    pub markers: SyncMarkers,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// e.g. `http://localhost:32400`
    pub url: Option<String>,
    /// The server owner's Plex token.
    pub token: Option<String>,
    pub timeout_secs: u64,
    /// Count `204 No Content` on a playlist delete as success.
    pub accept_no_content_on_delete: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: None,
            token: None,
            timeout_secs: 30,
            accept_no_content_on_delete: true,
        }
    }
}

impl Config {
    /// Load config from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .wrap_err(format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&contents)
            .wrap_err(format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|path| path.join("playlist-mirror").join("config.toml"))
    }

    /// Loads the default config file, or falls back to defaults when there is
    /// none so a run can be driven entirely from the environment.
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) if path.is_file() => Self::from_file(&path),
            Some(path) => {
                log::debug!("No config file at {}, using defaults", path.display());
                Ok(Self::default())
            }
            None => Ok(Self::default()),
        }
    }

    /// Server URL and owner token, with command line or environment values
    /// taking precedence over the file.
    pub fn server_credentials(
        &self,
        url_override: Option<&str>,
        token_override: Option<&str>,
    ) -> Result<(Url, String)> {
        let url = url_override
            .or(self.server.url.as_deref())
            .ok_or_else(|| eyre!("No Plex server URL configured. Set server.url or PLEX_URL"))?;
        let url = Url::parse(url).wrap_err(format!("Invalid server URL: {}", url))?;

        let token = token_override
            .or(self.server.token.as_deref())
            .ok_or_else(|| eyre!("No Plex token configured. Set server.token or PLEX_TOKEN"))?;

        Ok((url, token.to_string()))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.server.timeout_secs)
    }
}
