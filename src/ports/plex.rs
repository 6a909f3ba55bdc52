use std::collections::BTreeMap;

use crate::plex_rs::PlexError;
use crate::plex_rs::identity::PlexIdentity;
use crate::plex_rs::playlist::{PlexPlaylist, PlexPlaylistItem};

/// Port trait wrapping the Plex API capabilities used by the playlist sync.
///
/// Every call takes the access token of the account it acts on, so one
/// implementation serves all accounts sharing the server.
///
/// Implementations live in `services::plex::client` (production) or test mocks.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait PlexClient: Send + Sync {
    async fn server_identity(&self, token: &str) -> Result<PlexIdentity, PlexError>;

    /// Login name to delegated access token, for every account the server is
    /// shared with.
    async fn shared_accounts(
        &self,
        owner_token: &str,
        machine_identifier: &str,
    ) -> Result<BTreeMap<String, String>, PlexError>;

    async fn playlists(&self, token: &str) -> Result<Vec<PlexPlaylist>, PlexError>;

    async fn playlist_items(
        &self,
        token: &str,
        playlist_key: &str,
    ) -> Result<Vec<PlexPlaylistItem>, PlexError>;

    async fn create_playlist(
        &self,
        token: &str,
        machine_identifier: &str,
        title: &str,
        playlist_type: &str,
        rating_keys: &[String],
    ) -> Result<PlexPlaylist, PlexError>;

    async fn add_items(
        &self,
        token: &str,
        machine_identifier: &str,
        playlist_key: &str,
        rating_keys: &[String],
    ) -> Result<(), PlexError>;

    async fn remove_item(
        &self,
        token: &str,
        playlist_key: &str,
        playlist_item_id: u64,
    ) -> Result<(), PlexError>;

    /// Fails with [`PlexError::NotFound`] when the playlist is already gone.
    async fn delete_playlist(&self, token: &str, playlist_key: &str) -> Result<(), PlexError>;
}
