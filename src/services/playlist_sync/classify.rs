use std::hash::{Hash, Hasher};

use super::accounts::Account;
use super::error::SyncError;
use super::mirror_name::{MirrorName, SyncMarkers};
use crate::plex_rs::playlist::{PlexPlaylist, PlexPlaylistItem};
use crate::ports::plex::PlexClient;

/// An entry of a playlist. Two items are the same media when their server
/// keys match; titles can collide across distinct media.
#[derive(Debug, Clone)]
pub struct PlaylistItem {
    pub key: String,
    pub title: String,
    /// Position handle inside one playlist, needed to remove the entry.
    pub entry_id: Option<u64>,
}

impl PlaylistItem {
    #[cfg(test)]
    pub fn new(key: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            title: title.into(),
            entry_id: None,
        }
    }
}

impl PartialEq for PlaylistItem {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for PlaylistItem {}

impl Hash for PlaylistItem {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl From<PlexPlaylistItem> for PlaylistItem {
    fn from(item: PlexPlaylistItem) -> Self {
        Self {
            key: item.rating_key,
            title: item.title,
            entry_id: item.playlist_item_id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    Marker,
    Smart,
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaylistClass {
    Ignored(IgnoreReason),
    /// Created by a previous run. `None` when the title carries the sync
    /// marker but cannot be parsed back into an owner and title.
    Mirror(Option<MirrorName>),
    Source,
}

/// One playlist as it was on the server when the run started.
#[derive(Debug, Clone)]
pub struct PlaylistSnapshot {
    /// Identifier of the account the playlist belongs to.
    pub owner: String,
    pub key: String,
    pub title: String,
    pub playlist_type: String,
    pub items: Vec<PlaylistItem>,
    pub class: PlaylistClass,
}

impl PlaylistSnapshot {
    pub fn is_source(&self) -> bool {
        self.class == PlaylistClass::Source
    }

    pub fn is_mirror(&self) -> bool {
        matches!(self.class, PlaylistClass::Mirror(_))
    }
}

/// Markers are checked before anything else, so a marked playlist is never a
/// source.
pub fn classify(title: &str, smart: bool, item_count: usize, markers: &SyncMarkers) -> PlaylistClass {
    if title.starts_with(&markers.ignore) {
        PlaylistClass::Ignored(IgnoreReason::Marker)
    } else if title.starts_with(&markers.sync) {
        PlaylistClass::Mirror(MirrorName::parse(title, markers))
    } else if smart {
        PlaylistClass::Ignored(IgnoreReason::Smart)
    } else if item_count == 0 {
        PlaylistClass::Ignored(IgnoreReason::Empty)
    } else {
        PlaylistClass::Source
    }
}

/// Whether [`classify`] or the planner will look at the playlist's items.
/// A listing that already reports zero entries is not fetched.
fn wants_items(playlist: &PlexPlaylist, markers: &SyncMarkers) -> bool {
    if playlist.title.starts_with(&markers.ignore) || playlist.leaf_count == Some(0) {
        return false;
    }
    playlist.title.starts_with(&markers.sync) || !playlist.is_smart()
}

/// Lists and classifies every playlist of one account.
///
/// A failed listing is an error for the whole run; stale or partial data is
/// never substituted.
pub async fn scan_account<C: PlexClient + ?Sized>(
    client: &C,
    account: &Account,
    markers: &SyncMarkers,
) -> Result<Vec<PlaylistSnapshot>, SyncError> {
    log::info!(
        "Scanning playlists of {} - {}",
        account.display_name,
        account.identifier
    );

    let playlists = client.playlists(&account.token).await?;
    let mut snapshots = Vec::with_capacity(playlists.len());

    for playlist in playlists {
        let smart = playlist.is_smart();
        let items: Vec<PlaylistItem> = if wants_items(&playlist, markers) {
            client
                .playlist_items(&account.token, &playlist.rating_key)
                .await?
                .into_iter()
                .map(PlaylistItem::from)
                .collect()
        } else {
            Vec::new()
        };

        let class = classify(&playlist.title, smart, items.len(), markers);
        match &class {
            PlaylistClass::Ignored(IgnoreReason::Marker) => {
                log::info!("Ignoring {}", playlist.title)
            }
            PlaylistClass::Ignored(IgnoreReason::Smart) => {
                log::info!("Playlist {} is a smart playlist, ignoring", playlist.title)
            }
            PlaylistClass::Ignored(IgnoreReason::Empty) => {
                log::info!("Playlist {} is empty, ignoring", playlist.title)
            }
            PlaylistClass::Mirror(_) => log::debug!("Found mirror {}", playlist.title),
            PlaylistClass::Source => log::info!(
                "Found {} ({} items)",
                playlist.title,
                items.len()
            ),
        }

        snapshots.push(PlaylistSnapshot {
            owner: account.identifier.clone(),
            key: playlist.rating_key,
            title: playlist.title,
            playlist_type: playlist.playlist_type,
            items,
            class,
        });
    }

    Ok(snapshots)
}
