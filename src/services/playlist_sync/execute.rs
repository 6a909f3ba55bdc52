use super::accounts::{Account, AccountDirectory};
use super::error::SyncError;
use super::plan::{MirrorAction, ReconciliationPlan};
use crate::plex_rs::PlexError;
use crate::ports::plex::PlexClient;

/// An action that could not be applied, and why.
#[derive(Debug)]
pub struct ActionFailure {
    pub action: MirrorAction,
    pub error: SyncError,
}

/// What happened to each action of a plan.
#[derive(Debug, Default)]
pub struct ExecutionReport {
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    /// Actions only reported because of dry-run.
    pub skipped: usize,
    pub failures: Vec<ActionFailure>,
}

impl ExecutionReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Applies a [`ReconciliationPlan`] through the Plex port.
///
/// Actions are independent: a failing action is logged and recorded, and the
/// remaining ones are still attempted. Nothing is retried.
pub struct MirrorExecutor<'a, C: PlexClient + ?Sized> {
    client: &'a C,
    directory: &'a AccountDirectory,
    machine_identifier: &'a str,
    dry_run: bool,
}

impl<'a, C: PlexClient + ?Sized> MirrorExecutor<'a, C> {
    pub fn new(
        client: &'a C,
        directory: &'a AccountDirectory,
        machine_identifier: &'a str,
        dry_run: bool,
    ) -> Self {
        Self {
            client,
            directory,
            machine_identifier,
            dry_run,
        }
    }

    pub async fn execute(&self, plan: &ReconciliationPlan) -> ExecutionReport {
        let mut report = ExecutionReport::default();

        for action in plan.actions() {
            let Some(account) = self.directory.get(action.target()) else {
                report.failures.push(ActionFailure {
                    action: action.clone(),
                    error: SyncError::Consistency(format!(
                        "Planned action targets unknown account {:?}",
                        action.target()
                    )),
                });
                continue;
            };

            if self.dry_run {
                describe_dry_run(account, action);
                report.skipped += 1;
                continue;
            }

            match self.apply(account, action).await {
                Ok(()) => match action {
                    MirrorAction::Create { .. } => report.created += 1,
                    MirrorAction::Update { .. } => report.updated += 1,
                    MirrorAction::Delete { .. } => report.deleted += 1,
                },
                Err(error) => {
                    log::error!(
                        "Failed to apply {} for {}: {}",
                        action,
                        account.display_name,
                        error
                    );
                    report.failures.push(ActionFailure {
                        action: action.clone(),
                        error,
                    });
                }
            }
        }

        report
    }

    async fn apply(&self, account: &Account, action: &MirrorAction) -> Result<(), SyncError> {
        let token = account.token.as_str();

        match action {
            MirrorAction::Delete {
                playlist, reason, ..
            } => match self.client.delete_playlist(token, &playlist.key).await {
                Ok(()) => {
                    log::info!(
                        "Removed playlist {} from {} ({})",
                        playlist.title,
                        account.display_name,
                        reason
                    );
                    Ok(())
                }
                Err(PlexError::NotFound(_)) => {
                    log::info!(
                        "Playlist {} was already gone from {}",
                        playlist.title,
                        account.display_name
                    );
                    Ok(())
                }
                Err(e) => Err(e.into()),
            },
            MirrorAction::Create {
                name,
                playlist_type,
                items,
                ..
            } => {
                let keys: Vec<String> = items.iter().map(|item| item.key.clone()).collect();
                self.client
                    .create_playlist(token, self.machine_identifier, name, playlist_type, &keys)
                    .await?;
                log::info!(
                    "Created {} for {} with {} items",
                    name,
                    account.display_name,
                    keys.len()
                );
                Ok(())
            }
            MirrorAction::Update {
                playlist,
                to_add,
                to_remove,
                ..
            } => {
                log::info!(
                    "Syncing {} for {}",
                    playlist.title,
                    account.display_name
                );

                for item in to_remove {
                    let entry_id = item.entry_id.ok_or_else(|| {
                        SyncError::Consistency(format!(
                            "Item {:?} in {} has no playlist entry id",
                            item.title, playlist.title
                        ))
                    })?;
                    self.client
                        .remove_item(token, &playlist.key, entry_id)
                        .await?;
                    log::info!("- \"{}\" not found in source, removed", item.title);
                }

                if !to_add.is_empty() {
                    let keys: Vec<String> = to_add.iter().map(|item| item.key.clone()).collect();
                    self.client
                        .add_items(token, self.machine_identifier, &playlist.key, &keys)
                        .await?;
                    for item in to_add {
                        log::info!("- \"{}\" missing from mirror, added", item.title);
                    }
                }
                Ok(())
            }
        }
    }
}

fn describe_dry_run(account: &Account, action: &MirrorAction) {
    match action {
        MirrorAction::Delete {
            playlist, reason, ..
        } => log::info!(
            "Dry run, not removing {} from {} ({})",
            playlist.title,
            account.display_name,
            reason
        ),
        MirrorAction::Create { name, items, .. } => log::info!(
            "Dry run, not creating {} for {} ({} items)",
            name,
            account.display_name,
            items.len()
        ),
        MirrorAction::Update {
            playlist,
            to_add,
            to_remove,
            ..
        } => {
            log::info!(
                "Dry run, not syncing {} for {}",
                playlist.title,
                account.display_name
            );
            for item in to_remove {
                log::info!("- \"{}\" not found in source", item.title);
            }
            for item in to_add {
                log::info!("- \"{}\" missing from mirror", item.title);
            }
        }
    }
}
