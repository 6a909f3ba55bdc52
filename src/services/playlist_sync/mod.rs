pub mod accounts;
pub mod classify;
pub mod error;
pub mod execute;
pub mod mirror_name;
pub mod plan;

use accounts::{AccountSettings, resolve_accounts};
use classify::scan_account;
use error::SyncError;
use execute::{ExecutionReport, MirrorExecutor};
use mirror_name::SyncMarkers;
use plan::plan;

use crate::ports::plex::PlexClient;

/// How a run treats the plan it computes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunMode {
    /// Delete every mirror and create nothing.
    pub clean: bool,
    /// Report actions without applying them.
    pub dry_run: bool,
}

/// Outcome of one run.
#[derive(Debug)]
pub struct SyncReport {
    pub accounts: usize,
    pub sources: usize,
    pub mirrors: usize,
    pub planned: usize,
    pub execution: ExecutionReport,
}

/// Mirrors playlists between every account sharing one Plex server.
pub struct PlaylistSyncService<C: PlexClient> {
    client: C,
    owner_token: String,
    accounts: AccountSettings,
    markers: SyncMarkers,
}

impl<C: PlexClient> PlaylistSyncService<C> {
    pub fn new(
        client: C,
        owner_token: impl Into<String>,
        accounts: AccountSettings,
        markers: SyncMarkers,
    ) -> Self {
        Self {
            client,
            owner_token: owner_token.into(),
            accounts,
            markers,
        }
    }

    /// Runs one full sync: resolve accounts, scan, plan, execute.
    ///
    /// Everything up to planning is fatal on error, so nothing is mutated
    /// unless every account was verified and scanned. Failures while applying
    /// actions are collected in the report instead.
    pub async fn run(&self, mode: RunMode) -> Result<SyncReport, SyncError> {
        self.markers.validate()?;

        let identity = self.client.server_identity(&self.owner_token).await?;
        log::info!(
            "Plex server {} version {}",
            identity.machine_identifier,
            identity.version.as_deref().unwrap_or("unknown")
        );

        let directory = resolve_accounts(
            &self.client,
            &self.accounts,
            &self.markers,
            &self.owner_token,
            &identity.machine_identifier,
        )
        .await?;
        if directory.is_empty() {
            log::warn!("No accounts selected, nothing to sync");
        }

        let mut snapshots = Vec::new();
        for account in directory.iter() {
            snapshots.extend(scan_account(&self.client, account, &self.markers).await?);
        }

        let plan = plan(&directory, &snapshots, &self.markers, mode.clean);
        if plan.is_empty() {
            log::info!("All mirrors are up to date");
        } else {
            log::info!("Planned {} actions", plan.len());
        }

        let execution = MirrorExecutor::new(
            &self.client,
            &directory,
            &identity.machine_identifier,
            mode.dry_run,
        )
        .execute(&plan)
        .await;

        Ok(SyncReport {
            accounts: directory.len(),
            sources: snapshots.iter().filter(|s| s.is_source()).count(),
            mirrors: snapshots.iter().filter(|s| s.is_mirror()).count(),
            planned: plan.len(),
            execution,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::FakePlexServer;

    const MACHINE: &str = "machine-1";

    fn settings() -> AccountSettings {
        AccountSettings {
            allow_list: vec!["alice,Alice".to_string(), "bob,Bob".to_string()],
            include_owner: false,
            owner: "owner".to_string(),
        }
    }

    fn service(server: &FakePlexServer, accounts: AccountSettings) -> PlaylistSyncService<FakePlexServer> {
        PlaylistSyncService::new(
            server.clone(),
            "owner-token",
            accounts,
            SyncMarkers::default(),
        )
    }

    fn normal() -> RunMode {
        RunMode::default()
    }

    fn alice_and_bob() -> FakePlexServer {
        let server = FakePlexServer::new(MACHINE, "owner-token");
        server.add_account("alice", "alice-token");
        server.add_account("bob", "bob-token");
        server
    }

    #[tokio::test]
    async fn test_road_trip_scenario() {
        let server = alice_and_bob();
        server.seed_playlist("alice-token", "Road Trip", &["i1", "i2"]);
        let service = service(&server, settings());

        // First run creates Bob's mirror.
        let report = service.run(normal()).await.unwrap();
        assert_eq!(report.execution.created, 1);
        assert_eq!(
            server.items_of("bob-token", "|Alice: Road Trip"),
            Some(vec!["i1".to_string(), "i2".to_string()])
        );

        // Dropping i2 from the source leads to a single update.
        server.remove_from_playlist("alice-token", "Road Trip", "i2");
        let report = service.run(normal()).await.unwrap();
        assert_eq!(report.planned, 1);
        assert_eq!(report.execution.updated, 1);
        assert_eq!(report.execution.created + report.execution.deleted, 0);
        assert_eq!(
            server.items_of("bob-token", "|Alice: Road Trip"),
            Some(vec!["i1".to_string()])
        );

        // Deleting the source prunes the mirror.
        server.delete_by_title("alice-token", "Road Trip");
        let report = service.run(normal()).await.unwrap();
        assert_eq!(report.execution.deleted, 1);
        assert_eq!(server.items_of("bob-token", "|Alice: Road Trip"), None);
    }

    #[tokio::test]
    async fn test_second_run_is_idempotent() {
        let server = alice_and_bob();
        server.seed_playlist("alice-token", "Road Trip", &["i1", "i2"]);
        server.seed_playlist("bob-token", "Gym", &["i3"]);
        let service = service(&server, settings());

        service.run(normal()).await.unwrap();
        let report = service.run(normal()).await.unwrap();

        assert_eq!(report.planned, 0);
        assert!(report.execution.is_success());
    }

    #[tokio::test]
    async fn test_fan_out_and_pruning_across_accounts() {
        let server = FakePlexServer::new(MACHINE, "owner-token");
        for name in ["a", "b", "c", "d"] {
            server.add_account(name, &format!("{}-token", name));
        }
        server.seed_playlist("a-token", "Mix", &["i1", "i2", "i3"]);
        let accounts = AccountSettings {
            allow_list: Vec::new(),
            include_owner: false,
            owner: "owner".to_string(),
        };
        let service = service(&server, accounts);

        service.run(normal()).await.unwrap();
        for token in ["b-token", "c-token", "d-token"] {
            assert_eq!(
                server.items_of(token, "|a: Mix"),
                Some(vec!["i1".to_string(), "i2".to_string(), "i3".to_string()])
            );
        }
        assert_eq!(server.items_of("a-token", "|a: Mix"), None);

        server.delete_by_title("a-token", "Mix");
        let report = service.run(normal()).await.unwrap();
        assert_eq!(report.execution.deleted, 3);
        for token in ["b-token", "c-token", "d-token"] {
            assert_eq!(server.items_of(token, "|a: Mix"), None);
        }
    }

    #[tokio::test]
    async fn test_clean_mode_removes_every_mirror() {
        let server = alice_and_bob();
        server.seed_playlist("alice-token", "Road Trip", &["i1"]);
        server.seed_playlist("bob-token", "Gym", &["i2"]);
        let service = service(&server, settings());
        service.run(normal()).await.unwrap();
        assert_eq!(server.mirror_count(), 2);

        let report = service
            .run(RunMode {
                clean: true,
                dry_run: false,
            })
            .await
            .unwrap();

        assert_eq!(report.execution.deleted, 2);
        assert_eq!(report.execution.created, 0);
        assert_eq!(server.mirror_count(), 0);
        assert!(server.items_of("alice-token", "Road Trip").is_some());
    }

    #[tokio::test]
    async fn test_dry_run_leaves_server_untouched() {
        let server = alice_and_bob();
        server.seed_playlist("alice-token", "Road Trip", &["i1", "i2"]);
        server.seed_playlist("bob-token", "|Ghost: Gone", &["i9"]);
        let service = service(&server, settings());
        let before = server.dump();

        for clean in [false, true] {
            let report = service
                .run(RunMode {
                    clean,
                    dry_run: true,
                })
                .await
                .unwrap();
            assert!(report.execution.skipped > 0);
        }

        assert_eq!(server.dump(), before);
    }

    #[tokio::test]
    async fn test_unknown_account_aborts_before_mutation() {
        let server = alice_and_bob();
        server.seed_playlist("alice-token", "Road Trip", &["i1"]);
        let before = server.dump();
        let accounts = AccountSettings {
            allow_list: vec!["alice".to_string(), "mallory".to_string()],
            include_owner: true,
            owner: "owner".to_string(),
        };

        let result = service(&server, accounts).run(normal()).await;

        assert!(matches!(result, Err(SyncError::Configuration(_))));
        assert_eq!(server.dump(), before);
    }

    #[tokio::test]
    async fn test_no_accounts_is_an_empty_run() {
        let server = FakePlexServer::new(MACHINE, "owner-token");
        server.seed_playlist("owner-token", "Owner Picks", &["i5"]);
        let accounts = AccountSettings {
            allow_list: Vec::new(),
            include_owner: false,
            owner: "owner".to_string(),
        };

        let report = service(&server, accounts).run(normal()).await.unwrap();

        assert_eq!(report.accounts, 0);
        assert_eq!(report.planned, 0);
        assert!(report.execution.is_success());
        assert_eq!(server.mirror_count(), 0);
    }

    #[tokio::test]
    async fn test_owner_takes_part_with_primary_token() {
        let server = alice_and_bob();
        server.seed_playlist("owner-token", "Owner Picks", &["i5"]);
        let accounts = AccountSettings {
            allow_list: vec!["alice,Alice".to_string()],
            include_owner: true,
            owner: "owner,Olivia".to_string(),
        };

        service(&server, accounts).run(normal()).await.unwrap();

        assert_eq!(
            server.items_of("alice-token", "|Olivia: Owner Picks"),
            Some(vec!["i5".to_string()])
        );
        assert_eq!(server.items_of("bob-token", "|Olivia: Owner Picks"), None);
    }
}
