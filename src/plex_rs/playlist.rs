use reqwest::{Client, StatusCode};
use serde::Deserialize;
use url::Url;

use super::{PlexError, PlexResponse, check_status, read_json, with_token};

/* ---------- Playlists ---------- */

#[derive(Debug, Clone, Deserialize)]
pub struct PlexPlaylist {
    #[serde(rename = "ratingKey")]
    pub rating_key: String,

    pub title: String,

    #[serde(rename = "playlistType")]
    pub playlist_type: String,

    #[serde(default)]
    pub smart: Option<bool>,

    #[serde(rename = "leafCount", default)]
    pub leaf_count: Option<u32>,
}

impl PlexPlaylist {
    pub fn is_smart(&self) -> bool {
        self.smart.unwrap_or(false)
    }
}

/// Lists every playlist visible to `user_token`, of all playlist types.
pub async fn get_playlists(
    client: &Client,
    base_url: &Url,
    user_token: &str,
) -> Result<Vec<PlexPlaylist>, PlexError> {
    let url = base_url.join("playlists")?;

    let res = with_token(client.get(url), user_token).send().await?;
    let res = read_json::<PlexResponse<PlexPlaylist>>(res, "Plex playlists response").await?;

    Ok(res.media_container.metadata)
}

/* ---------- Playlist items ---------- */

#[derive(Debug, Clone, Deserialize)]
pub struct PlexPlaylistItem {
    #[serde(rename = "ratingKey")]
    pub rating_key: String,

    #[serde(rename = "playlistItemID", default)]
    pub playlist_item_id: Option<u64>,

    #[serde(default)]
    pub title: String,
}

pub async fn get_playlist_items(
    client: &Client,
    base_url: &Url,
    user_token: &str,
    playlist_key: &str,
) -> Result<Vec<PlexPlaylistItem>, PlexError> {
    let url = base_url.join(&format!("playlists/{}/items", playlist_key))?;

    let res = with_token(client.get(url), user_token).send().await?;
    let res =
        read_json::<PlexResponse<PlexPlaylistItem>>(res, "Plex playlist items response").await?;

    Ok(res.media_container.metadata)
}

/// Builds the `server://` URI that addresses library items on one server.
///
/// Multiple rating keys are joined with commas so a single request can carry
/// a whole item list.
pub fn library_items_uri(machine_identifier: &str, rating_keys: &[String]) -> String {
    format!(
        "server://{}/com.plexapp.plugins.library/library/metadata/{}",
        machine_identifier,
        rating_keys.join(",")
    )
}

/* ---------- Create, add and remove ---------- */

pub async fn create_playlist(
    client: &Client,
    base_url: &Url,
    user_token: &str,
    machine_identifier: &str,
    title: &str,
    playlist_type: &str,
    rating_keys: &[String],
) -> Result<PlexPlaylist, PlexError> {
    let mut url = base_url.join("playlists")?;
    url.query_pairs_mut()
        .append_pair("type", playlist_type)
        .append_pair("title", title)
        .append_pair("smart", "0")
        .append_pair("uri", &library_items_uri(machine_identifier, rating_keys));

    let res = with_token(client.post(url), user_token).send().await?;
    let res = read_json::<PlexResponse<PlexPlaylist>>(res, "create playlist response").await?;

    res.media_container
        .metadata
        .into_iter()
        .next()
        .ok_or_else(|| PlexError::Parse("Create playlist response had no Metadata".to_string()))
}

pub async fn add_items_to_playlist(
    client: &Client,
    base_url: &Url,
    user_token: &str,
    machine_identifier: &str,
    playlist_key: &str,
    rating_keys: &[String],
) -> Result<(), PlexError> {
    let mut url = base_url.join(&format!("playlists/{}/items", playlist_key))?;
    url.query_pairs_mut()
        .append_pair("uri", &library_items_uri(machine_identifier, rating_keys));

    let res = with_token(client.put(url), user_token).send().await?;
    check_status(res).await?;

    Ok(())
}

pub async fn remove_item_from_playlist(
    client: &Client,
    base_url: &Url,
    user_token: &str,
    playlist_key: &str,
    playlist_item_id: u64,
) -> Result<(), PlexError> {
    let url = base_url.join(&format!(
        "playlists/{}/items/{}",
        playlist_key, playlist_item_id
    ))?;

    let res = with_token(client.delete(url), user_token).send().await?;
    check_status(res).await?;

    Ok(())
}

/* ---------- Delete ---------- */

/// Deletes a playlist.
///
/// Only `200 OK` counts as success, unless `accept_no_content` is set, in
/// which case `204 No Content` does too. Some server and client pairings
/// answer a delete with 204 and an empty body. A missing playlist surfaces as
/// [`PlexError::NotFound`].
pub async fn delete_playlist(
    client: &Client,
    base_url: &Url,
    user_token: &str,
    playlist_key: &str,
    accept_no_content: bool,
) -> Result<(), PlexError> {
    let url = base_url.join(&format!("playlists/{}", playlist_key))?;

    let res = with_token(client.delete(url), user_token).send().await?;
    let res = check_status(res).await?;

    match res.status() {
        StatusCode::OK => Ok(()),
        StatusCode::NO_CONTENT if accept_no_content => {
            log::debug!("Delete of playlist {} answered with 204", playlist_key);
            Ok(())
        }
        status => Err(PlexError::Status {
            status,
            url: res.url().to_string(),
            body: res.text().await.unwrap_or_default(),
        }),
    }
}
