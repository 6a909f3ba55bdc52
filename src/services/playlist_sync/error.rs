use crate::plex_rs::PlexError;

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// The configured accounts or markers cannot be used as given.
    #[error("Configuration error: {0}")]
    Configuration(String),
    /// The resolved account set breaks an invariant the planner relies on.
    #[error("Consistency error: {0}")]
    Consistency(String),
    #[error("Plex request failed: {0}")]
    Transport(#[from] PlexError),
}
