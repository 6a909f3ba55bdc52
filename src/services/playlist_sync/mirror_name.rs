use serde::Deserialize;

use super::error::SyncError;

/// Sits between the owner's display name and the source title in a mirror
/// title.
pub const NAME_SEPARATOR: &str = ": ";

/// Title prefixes that decide how a playlist is treated.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SyncMarkers {
    /// Playlists starting with this are never touched.
    pub ignore: String,
    /// Playlists starting with this were created by a previous run.
    pub sync: String,
}

impl Default for SyncMarkers {
    fn default() -> Self {
        Self {
            ignore: "!".to_string(),
            sync: "|".to_string(),
        }
    }
}

impl SyncMarkers {
    /// Both markers must be non-empty and neither may start with the other,
    /// otherwise a title could be both ignored and a mirror.
    pub fn validate(&self) -> Result<(), SyncError> {
        if self.ignore.is_empty() || self.sync.is_empty() {
            return Err(SyncError::Configuration(
                "Ignore and sync markers must not be empty".to_string(),
            ));
        }
        if self.ignore.starts_with(&self.sync) || self.sync.starts_with(&self.ignore) {
            return Err(SyncError::Configuration(format!(
                "Ignore marker {:?} and sync marker {:?} overlap",
                self.ignore, self.sync
            )));
        }
        Ok(())
    }
}

/// The owner and source title a mirror playlist stands for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MirrorName {
    pub owner: String,
    pub title: String,
}

impl MirrorName {
    pub fn new(owner: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            title: title.into(),
        }
    }

    /// `<sync marker><owner>: <title>`
    pub fn render(&self, markers: &SyncMarkers) -> String {
        format!(
            "{}{}{}{}",
            markers.sync, self.owner, NAME_SEPARATOR, self.title
        )
    }

    /// Reverses [`MirrorName::render`]. The owner ends at the first separator,
    /// so the source title may itself contain `": "`.
    pub fn parse(playlist_title: &str, markers: &SyncMarkers) -> Option<Self> {
        let rest = playlist_title.strip_prefix(markers.sync.as_str())?;
        let (owner, title) = rest.split_once(NAME_SEPARATOR)?;
        if owner.is_empty() {
            return None;
        }
        Some(Self::new(owner, title))
    }
}

/// A display name can only be recovered from a mirror title if it does not
/// contain the separator, and a mirror titled after it must not look like a
/// mirror of a different name.
pub fn validate_display_name(display_name: &str, markers: &SyncMarkers) -> Result<(), SyncError> {
    if display_name.trim().is_empty() {
        return Err(SyncError::Configuration(
            "Display names must not be empty".to_string(),
        ));
    }
    if display_name.starts_with(&markers.sync) {
        return Err(SyncError::Configuration(format!(
            "Display name {:?} must not start with the sync marker {:?}",
            display_name, markers.sync
        )));
    }
    if display_name.contains(NAME_SEPARATOR) {
        return Err(SyncError::Configuration(format!(
            "Display name {:?} must not contain {:?}",
            display_name, NAME_SEPARATOR
        )));
    }
    Ok(())
}
