pub mod playlist_sync;
pub mod plex;
