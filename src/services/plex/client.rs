use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::Client;
use url::Url;

use crate::plex_rs::identity::{PlexIdentity, get_server_identity};
use crate::plex_rs::playlist::{
    PlexPlaylist, PlexPlaylistItem, add_items_to_playlist, create_playlist, delete_playlist,
    get_playlist_items, get_playlists, remove_item_from_playlist,
};
use crate::plex_rs::users::get_shared_accounts;
use crate::plex_rs::{PLEX_TV_URL, PlexError};
use crate::ports::plex::PlexClient;

/// Compatibility switches for the server and client pairing in use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerCompat {
    /// Treat `204 No Content` on a playlist delete as success.
    pub accept_no_content_on_delete: bool,
}

impl Default for ServerCompat {
    fn default() -> Self {
        Self {
            accept_no_content_on_delete: true,
        }
    }
}

pub struct PlexHttpAdapter {
    client: Client,
    server_url: Url,
    plex_tv_url: Url,
    compat: ServerCompat,
}

impl PlexHttpAdapter {
    pub fn new(server_url: Url, timeout: Duration, compat: ServerCompat) -> Result<Self, PlexError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            server_url,
            plex_tv_url: Url::parse(PLEX_TV_URL)?,
            compat,
        })
    }

    /// Points the plex.tv calls somewhere else.
    #[cfg(test)]
    pub fn with_plex_tv_url(mut self, plex_tv_url: Url) -> Self {
        self.plex_tv_url = plex_tv_url;
        self
    }
}

#[async_trait::async_trait]
impl PlexClient for PlexHttpAdapter {
    async fn server_identity(&self, token: &str) -> Result<PlexIdentity, PlexError> {
        get_server_identity(&self.client, &self.server_url, token).await
    }

    async fn shared_accounts(
        &self,
        owner_token: &str,
        machine_identifier: &str,
    ) -> Result<BTreeMap<String, String>, PlexError> {
        get_shared_accounts(
            &self.client,
            &self.plex_tv_url,
            owner_token,
            machine_identifier,
        )
        .await
    }

    async fn playlists(&self, token: &str) -> Result<Vec<PlexPlaylist>, PlexError> {
        get_playlists(&self.client, &self.server_url, token).await
    }

    async fn playlist_items(
        &self,
        token: &str,
        playlist_key: &str,
    ) -> Result<Vec<PlexPlaylistItem>, PlexError> {
        get_playlist_items(&self.client, &self.server_url, token, playlist_key).await
    }

    async fn create_playlist(
        &self,
        token: &str,
        machine_identifier: &str,
        title: &str,
        playlist_type: &str,
        rating_keys: &[String],
    ) -> Result<PlexPlaylist, PlexError> {
        create_playlist(
            &self.client,
            &self.server_url,
            token,
            machine_identifier,
            title,
            playlist_type,
            rating_keys,
        )
        .await
    }

    async fn add_items(
        &self,
        token: &str,
        machine_identifier: &str,
        playlist_key: &str,
        rating_keys: &[String],
    ) -> Result<(), PlexError> {
        add_items_to_playlist(
            &self.client,
            &self.server_url,
            token,
            machine_identifier,
            playlist_key,
            rating_keys,
        )
        .await
    }

    async fn remove_item(
        &self,
        token: &str,
        playlist_key: &str,
        playlist_item_id: u64,
    ) -> Result<(), PlexError> {
        remove_item_from_playlist(
            &self.client,
            &self.server_url,
            token,
            playlist_key,
            playlist_item_id,
        )
        .await
    }

    async fn delete_playlist(&self, token: &str, playlist_key: &str) -> Result<(), PlexError> {
        delete_playlist(
            &self.client,
            &self.server_url,
            token,
            playlist_key,
            self.compat.accept_no_content_on_delete,
        )
        .await
    }
}
