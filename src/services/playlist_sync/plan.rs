use std::collections::HashSet;
use std::fmt;

use super::accounts::{Account, AccountDirectory};
use super::classify::{PlaylistClass, PlaylistItem, PlaylistSnapshot};
use super::mirror_name::{MirrorName, SyncMarkers};

/// An existing playlist on the target account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistRef {
    pub key: String,
    pub title: String,
}

impl From<&PlaylistSnapshot> for PlaylistRef {
    fn from(snapshot: &PlaylistSnapshot) -> Self {
        Self {
            key: snapshot.key.clone(),
            title: snapshot.title.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteReason {
    /// Sync marker present but no owner and title could be read back.
    Unparseable,
    /// No account in this run has the display name in the title.
    UnknownOwner,
    /// The title names the account the mirror lives on.
    OwnMirror,
    /// The owner no longer has a source playlist with that title.
    SourceGone,
    /// An earlier playlist on the same account already mirrors that source.
    Duplicate,
    Clean,
}

impl fmt::Display for DeleteReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::Unparseable => "title cannot be parsed",
            Self::UnknownOwner => "owner not found",
            Self::OwnMirror => "mirror of its own account",
            Self::SourceGone => "source playlist not found",
            Self::Duplicate => "duplicate mirror",
            Self::Clean => "clean mode",
        };
        f.write_str(reason)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MirrorAction {
    Delete {
        target: String,
        playlist: PlaylistRef,
        reason: DeleteReason,
    },
    Create {
        target: String,
        name: String,
        playlist_type: String,
        items: Vec<PlaylistItem>,
    },
    Update {
        target: String,
        playlist: PlaylistRef,
        to_add: Vec<PlaylistItem>,
        to_remove: Vec<PlaylistItem>,
    },
}

impl MirrorAction {
    /// Identifier of the account the action changes.
    pub fn target(&self) -> &str {
        match self {
            Self::Delete { target, .. } | Self::Create { target, .. } | Self::Update { target, .. } => {
                target
            }
        }
    }
}

impl fmt::Display for MirrorAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Delete { playlist, .. } => write!(f, "delete of {}", playlist.title),
            Self::Create { name, .. } => write!(f, "create of {}", name),
            Self::Update { playlist, .. } => write!(f, "update of {}", playlist.title),
        }
    }
}

/// Actions for one run, deletions first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconciliationPlan {
    actions: Vec<MirrorAction>,
}

impl ReconciliationPlan {
    pub fn actions(&self) -> &[MirrorAction] {
        &self.actions
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn from_actions(actions: Vec<MirrorAction>) -> Self {
        Self { actions }
    }
}

fn playlists_of<'a>(
    snapshots: &'a [PlaylistSnapshot],
    account: &'a Account,
) -> impl Iterator<Item = &'a PlaylistSnapshot> {
    snapshots
        .iter()
        .filter(move |snapshot| snapshot.owner == account.identifier)
}

/// Why a mirror on `holder` should go, or `None` if its source is current.
fn staleness(
    holder: &Account,
    origin: Option<&MirrorName>,
    directory: &AccountDirectory,
    snapshots: &[PlaylistSnapshot],
) -> Option<DeleteReason> {
    let Some(origin) = origin else {
        return Some(DeleteReason::Unparseable);
    };
    let Some(owner) = directory.by_display_name(&origin.owner) else {
        return Some(DeleteReason::UnknownOwner);
    };
    if owner.identifier == holder.identifier {
        return Some(DeleteReason::OwnMirror);
    }

    let source_exists = playlists_of(snapshots, owner)
        .any(|snapshot| snapshot.is_source() && snapshot.title == origin.title);
    if source_exists {
        None
    } else {
        Some(DeleteReason::SourceGone)
    }
}

/// Items only in the mirror are removed; items only in the source are added
/// once each, in source order.
fn diff_items(
    source: &[PlaylistItem],
    mirror: &[PlaylistItem],
) -> (Vec<PlaylistItem>, Vec<PlaylistItem>) {
    let source_keys: HashSet<&str> = source.iter().map(|item| item.key.as_str()).collect();
    let mirror_keys: HashSet<&str> = mirror.iter().map(|item| item.key.as_str()).collect();

    let to_remove = mirror
        .iter()
        .filter(|item| !source_keys.contains(item.key.as_str()))
        .cloned()
        .collect();

    let mut queued = HashSet::new();
    let to_add = source
        .iter()
        .filter(|item| {
            !mirror_keys.contains(item.key.as_str()) && queued.insert(item.key.as_str())
        })
        .cloned()
        .collect();

    (to_add, to_remove)
}

/// Computes the actions that bring every account's mirrors in line with the
/// current sources.
///
/// Pure and deterministic: accounts are visited in directory order and
/// playlists in the order they were listed. Snapshots of accounts outside the
/// directory are ignored. In `clean` mode every mirror is deleted and nothing
/// is created or updated. Updates that would change nothing are left out.
pub fn plan(
    directory: &AccountDirectory,
    snapshots: &[PlaylistSnapshot],
    markers: &SyncMarkers,
    clean: bool,
) -> ReconciliationPlan {
    let mut actions = Vec::new();

    for holder in directory.iter() {
        let mut kept = HashSet::new();

        for mirror in playlists_of(snapshots, holder) {
            let PlaylistClass::Mirror(origin) = &mirror.class else {
                continue;
            };
            let reason = if clean {
                Some(DeleteReason::Clean)
            } else {
                match staleness(holder, origin.as_ref(), directory, snapshots) {
                    Some(reason) => Some(reason),
                    None if !kept.insert(mirror.title.as_str()) => Some(DeleteReason::Duplicate),
                    None => None,
                }
            };
            if let Some(reason) = reason {
                actions.push(MirrorAction::Delete {
                    target: holder.identifier.clone(),
                    playlist: mirror.into(),
                    reason,
                });
            }
        }
    }

    if clean {
        return ReconciliationPlan { actions };
    }

    for owner in directory.iter() {
        let mut fanned_out = HashSet::new();

        for source in playlists_of(snapshots, owner).filter(|s| s.is_source()) {
            if !fanned_out.insert(source.title.as_str()) {
                log::warn!(
                    "{} has more than one playlist titled {}, only the first is synced",
                    owner.display_name,
                    source.title
                );
                continue;
            }

            let name = MirrorName::new(&owner.display_name, &source.title).render(markers);

            for target in directory
                .iter()
                .filter(|target| target.identifier != owner.identifier)
            {
                let existing = playlists_of(snapshots, target)
                    .find(|snapshot| snapshot.is_mirror() && snapshot.title == name);

                match existing {
                    Some(mirror) => {
                        let (to_add, to_remove) = diff_items(&source.items, &mirror.items);
                        if !to_add.is_empty() || !to_remove.is_empty() {
                            actions.push(MirrorAction::Update {
                                target: target.identifier.clone(),
                                playlist: mirror.into(),
                                to_add,
                                to_remove,
                            });
                        }
                    }
                    None => actions.push(MirrorAction::Create {
                        target: target.identifier.clone(),
                        name: name.clone(),
                        playlist_type: source.playlist_type.clone(),
                        items: source.items.clone(),
                    }),
                }
            }
        }
    }

    ReconciliationPlan { actions }
}
