use std::collections::HashSet;

use serde::Deserialize;

use super::error::SyncError;
use super::mirror_name::{SyncMarkers, validate_display_name};
use crate::ports::plex::PlexClient;

/// One account taking part in a run, with the token that acts on its view of
/// the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub identifier: String,
    pub display_name: String,
    pub token: String,
    pub is_owner: bool,
}

/// An `identifier` or `identifier,alias` entry from the allow-list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowListEntry {
    pub identifier: String,
    pub display_name: String,
}

impl AllowListEntry {
    pub fn parse(entry: &str) -> Result<Self, SyncError> {
        let (identifier, alias) = match entry.split_once(',') {
            Some((identifier, alias)) => (identifier.trim(), Some(alias.trim())),
            None => (entry.trim(), None),
        };

        if identifier.is_empty() {
            return Err(SyncError::Configuration(format!(
                "Allow-list entry {:?} has no account identifier",
                entry
            )));
        }

        let display_name = match alias {
            Some(alias) if !alias.is_empty() => alias,
            _ => identifier,
        };

        Ok(Self {
            identifier: identifier.to_string(),
            display_name: display_name.to_string(),
        })
    }
}

/// Which accounts take part in a run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AccountSettings {
    /// Empty means every account the server is shared with.
    pub allow_list: Vec<String>,
    /// Sync the server owner's own playlists too.
    pub include_owner: bool,
    /// Label for the owner, `name` or `name,alias`. Not checked against plex.tv.
    pub owner: String,
}

impl Default for AccountSettings {
    fn default() -> Self {
        Self {
            allow_list: Vec::new(),
            include_owner: true,
            owner: "ServerOwner".to_string(),
        }
    }
}

/// Ordered mapping from account identifier to [`Account`].
///
/// Identifiers and display names are both unique, so a display name recovered
/// from a mirror title names exactly one account.
#[derive(Debug, Clone, Default)]
pub struct AccountDirectory {
    accounts: Vec<Account>,
}

impl AccountDirectory {
    pub fn new(accounts: Vec<Account>, markers: &SyncMarkers) -> Result<Self, SyncError> {
        let mut identifiers = HashSet::new();
        let mut display_names = HashSet::new();

        for account in &accounts {
            validate_display_name(&account.display_name, markers)?;

            if !identifiers.insert(account.identifier.as_str()) {
                return Err(SyncError::Consistency(format!(
                    "Account {:?} is listed more than once",
                    account.identifier
                )));
            }
            if !display_names.insert(account.display_name.as_str()) {
                return Err(SyncError::Consistency(format!(
                    "Display name {:?} is used by more than one account",
                    account.display_name
                )));
            }
        }

        Ok(Self { accounts })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Account> {
        self.accounts.iter()
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    pub fn get(&self, identifier: &str) -> Option<&Account> {
        self.accounts.iter().find(|a| a.identifier == identifier)
    }

    pub fn by_display_name(&self, display_name: &str) -> Option<&Account> {
        self.accounts
            .iter()
            .find(|a| a.display_name == display_name)
    }
}

/// Resolves the configured accounts against the accounts the server is shared
/// with.
///
/// Fails before anything is synced if any allow-listed account cannot be
/// verified; a partial account set would leave mirrors diverging.
pub async fn resolve_accounts<C: PlexClient + ?Sized>(
    client: &C,
    settings: &AccountSettings,
    markers: &SyncMarkers,
    owner_token: &str,
    machine_identifier: &str,
) -> Result<AccountDirectory, SyncError> {
    let shared = client
        .shared_accounts(owner_token, machine_identifier)
        .await?;
    log::debug!("Server is shared with {} accounts", shared.len());

    let entries = if settings.allow_list.is_empty() {
        log::info!("Allow-list is empty, syncing every shared account");
        shared
            .keys()
            .map(|identifier| AllowListEntry {
                identifier: identifier.clone(),
                display_name: identifier.clone(),
            })
            .collect()
    } else {
        settings
            .allow_list
            .iter()
            .map(|entry| AllowListEntry::parse(entry))
            .collect::<Result<Vec<_>, _>>()?
    };

    let mut accounts = Vec::with_capacity(entries.len() + 1);
    for entry in entries {
        let token = shared.get(&entry.identifier).ok_or_else(|| {
            SyncError::Configuration(format!(
                "Account {:?} not found among the accounts sharing this server",
                entry.identifier
            ))
        })?;
        accounts.push(Account {
            identifier: entry.identifier,
            display_name: entry.display_name,
            token: token.clone(),
            is_owner: false,
        });
    }

    if settings.include_owner {
        let owner = AllowListEntry::parse(&settings.owner)?;
        accounts.push(Account {
            identifier: owner.identifier,
            display_name: owner.display_name,
            token: owner_token.to_string(),
            is_owner: true,
        });
    }

    let directory = AccountDirectory::new(accounts, markers)?;
    for account in directory.iter() {
        log::info!(
            "Account {} - {}{}",
            account.display_name,
            account.identifier,
            if account.is_owner { " (owner)" } else { "" }
        );
    }

    Ok(directory)
}
