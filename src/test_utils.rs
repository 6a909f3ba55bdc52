use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use reqwest::StatusCode;

use crate::plex_rs::PlexError;
use crate::plex_rs::identity::PlexIdentity;
use crate::plex_rs::playlist::{PlexPlaylist, PlexPlaylistItem};
use crate::ports::plex::PlexClient;

#[derive(Debug, Clone)]
struct FakePlaylist {
    key: String,
    title: String,
    playlist_type: String,
    smart: bool,
    /// (playlistItemID, ratingKey)
    entries: Vec<(u64, String)>,
}

#[derive(Debug, Default)]
struct FakeState {
    machine_identifier: String,
    owner_token: String,
    shared: BTreeMap<String, String>,
    /// Playlists keyed by the token of the account that owns them.
    playlists: BTreeMap<String, Vec<FakePlaylist>>,
    next_id: u64,
}

impl FakeState {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn playlist_mut(&mut self, token: &str, key: &str) -> Result<&mut FakePlaylist, PlexError> {
        self.playlists
            .get_mut(token)
            .and_then(|playlists| playlists.iter_mut().find(|p| p.key == key))
            .ok_or_else(|| PlexError::NotFound(format!("/playlists/{}", key)))
    }
}

/// In-memory Plex server shared by clones, for driving whole sync runs.
#[derive(Debug, Clone)]
pub struct FakePlexServer {
    state: Arc<Mutex<FakeState>>,
}

impl FakePlexServer {
    pub fn new(machine_identifier: &str, owner_token: &str) -> Self {
        Self {
            state: Arc::new(Mutex::new(FakeState {
                machine_identifier: machine_identifier.to_string(),
                owner_token: owner_token.to_string(),
                ..FakeState::default()
            })),
        }
    }

    pub fn add_account(&self, identifier: &str, token: &str) {
        let mut state = self.state.lock().unwrap();
        state
            .shared
            .insert(identifier.to_string(), token.to_string());
    }

    pub fn seed_playlist(&self, token: &str, title: &str, item_keys: &[&str]) {
        let mut state = self.state.lock().unwrap();
        let key = state.next_id().to_string();
        let mut entries = Vec::new();
        for item in item_keys {
            entries.push((state.next_id(), item.to_string()));
        }
        state
            .playlists
            .entry(token.to_string())
            .or_default()
            .push(FakePlaylist {
                key,
                title: title.to_string(),
                playlist_type: "audio".to_string(),
                smart: false,
                entries,
            });
    }

    pub fn remove_from_playlist(&self, token: &str, title: &str, item_key: &str) {
        let mut state = self.state.lock().unwrap();
        if let Some(playlist) = state
            .playlists
            .get_mut(token)
            .and_then(|playlists| playlists.iter_mut().find(|p| p.title == title))
        {
            playlist.entries.retain(|(_, key)| key != item_key);
        }
    }

    pub fn delete_by_title(&self, token: &str, title: &str) {
        let mut state = self.state.lock().unwrap();
        if let Some(playlists) = state.playlists.get_mut(token) {
            playlists.retain(|p| p.title != title);
        }
    }

    /// Item keys of the playlist titled `title`, in order.
    pub fn items_of(&self, token: &str, title: &str) -> Option<Vec<String>> {
        let state = self.state.lock().unwrap();
        state
            .playlists
            .get(token)?
            .iter()
            .find(|p| p.title == title)
            .map(|p| p.entries.iter().map(|(_, key)| key.clone()).collect())
    }

    pub fn mirror_count(&self) -> usize {
        let state = self.state.lock().unwrap();
        state
            .playlists
            .values()
            .flatten()
            .filter(|p| p.title.starts_with('|'))
            .count()
    }

    /// Every playlist of every account as `(title, item keys)`, for
    /// before/after comparisons.
    pub fn dump(&self) -> BTreeMap<String, Vec<(String, Vec<String>)>> {
        let state = self.state.lock().unwrap();
        state
            .playlists
            .iter()
            .map(|(token, playlists)| {
                let playlists = playlists
                    .iter()
                    .map(|p| {
                        (
                            p.title.clone(),
                            p.entries.iter().map(|(_, key)| key.clone()).collect(),
                        )
                    })
                    .collect();
                (token.clone(), playlists)
            })
            .collect()
    }
}

#[async_trait::async_trait]
impl PlexClient for FakePlexServer {
    async fn server_identity(&self, token: &str) -> Result<PlexIdentity, PlexError> {
        let state = self.state.lock().unwrap();
        if token != state.owner_token {
            return Err(PlexError::Status {
                status: StatusCode::UNAUTHORIZED,
                url: "/identity".to_string(),
                body: String::new(),
            });
        }
        Ok(PlexIdentity {
            machine_identifier: state.machine_identifier.clone(),
            version: Some("1.40.0".to_string()),
        })
    }

    async fn shared_accounts(
        &self,
        owner_token: &str,
        machine_identifier: &str,
    ) -> Result<BTreeMap<String, String>, PlexError> {
        let state = self.state.lock().unwrap();
        if owner_token != state.owner_token || machine_identifier != state.machine_identifier {
            return Err(PlexError::NotFound(format!(
                "/api/servers/{}/shared_servers",
                machine_identifier
            )));
        }
        Ok(state.shared.clone())
    }

    async fn playlists(&self, token: &str) -> Result<Vec<PlexPlaylist>, PlexError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .playlists
            .get(token)
            .map(|playlists| {
                playlists
                    .iter()
                    .map(|p| PlexPlaylist {
                        rating_key: p.key.clone(),
                        title: p.title.clone(),
                        playlist_type: p.playlist_type.clone(),
                        smart: Some(p.smart),
                        leaf_count: Some(p.entries.len() as u32),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn playlist_items(
        &self,
        token: &str,
        playlist_key: &str,
    ) -> Result<Vec<PlexPlaylistItem>, PlexError> {
        let mut state = self.state.lock().unwrap();
        let playlist = state.playlist_mut(token, playlist_key)?;
        Ok(playlist
            .entries
            .iter()
            .map(|(entry_id, key)| PlexPlaylistItem {
                rating_key: key.clone(),
                playlist_item_id: Some(*entry_id),
                title: format!("Track {}", key),
            })
            .collect())
    }

    async fn create_playlist(
        &self,
        token: &str,
        machine_identifier: &str,
        title: &str,
        playlist_type: &str,
        rating_keys: &[String],
    ) -> Result<PlexPlaylist, PlexError> {
        let mut state = self.state.lock().unwrap();
        assert_eq!(machine_identifier, state.machine_identifier);

        let key = state.next_id().to_string();
        let mut entries = Vec::new();
        for item in rating_keys {
            entries.push((state.next_id(), item.clone()));
        }
        state
            .playlists
            .entry(token.to_string())
            .or_default()
            .push(FakePlaylist {
                key: key.clone(),
                title: title.to_string(),
                playlist_type: playlist_type.to_string(),
                smart: false,
                entries,
            });

        Ok(PlexPlaylist {
            rating_key: key,
            title: title.to_string(),
            playlist_type: playlist_type.to_string(),
            smart: Some(false),
            leaf_count: Some(rating_keys.len() as u32),
        })
    }

    async fn add_items(
        &self,
        token: &str,
        machine_identifier: &str,
        playlist_key: &str,
        rating_keys: &[String],
    ) -> Result<(), PlexError> {
        let mut state = self.state.lock().unwrap();
        assert_eq!(machine_identifier, state.machine_identifier);

        let ids: Vec<u64> = rating_keys.iter().map(|_| state.next_id()).collect();
        let playlist = state.playlist_mut(token, playlist_key)?;
        playlist
            .entries
            .extend(ids.into_iter().zip(rating_keys.iter().cloned()));
        Ok(())
    }

    async fn remove_item(
        &self,
        token: &str,
        playlist_key: &str,
        playlist_item_id: u64,
    ) -> Result<(), PlexError> {
        let mut state = self.state.lock().unwrap();
        let playlist = state.playlist_mut(token, playlist_key)?;
        let before = playlist.entries.len();
        playlist.entries.retain(|(id, _)| *id != playlist_item_id);
        if playlist.entries.len() == before {
            return Err(PlexError::NotFound(format!(
                "/playlists/{}/items/{}",
                playlist_key, playlist_item_id
            )));
        }
        Ok(())
    }

    async fn delete_playlist(&self, token: &str, playlist_key: &str) -> Result<(), PlexError> {
        let mut state = self.state.lock().unwrap();
        let playlists = state
            .playlists
            .get_mut(token)
            .ok_or_else(|| PlexError::NotFound(format!("/playlists/{}", playlist_key)))?;
        let before = playlists.len();
        playlists.retain(|p| p.key != playlist_key);
        if playlists.len() == before {
            return Err(PlexError::NotFound(format!("/playlists/{}", playlist_key)));
        }
        Ok(())
    }
}
