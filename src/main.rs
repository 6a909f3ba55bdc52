mod config;
mod logging;
mod plex_rs;
mod ports;
mod services;
#[cfg(test)]
mod test_utils;

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use color_eyre::{Result, eyre::Context, eyre::eyre};

use crate::{
    config::Config,
    logging::setup_logging,
    services::playlist_sync::{PlaylistSyncService, RunMode},
    services::plex::{PlexHttpAdapter, ServerCompat},
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Run modes, may be combined
    #[arg(value_enum)]
    modes: Vec<Mode>,

    /// The config file to use
    #[arg(short, long, env = "PLAYLIST_MIRROR_CONFIG")]
    config: Option<PathBuf>,

    /// Plex server URL, overrides the config file
    #[arg(long, env = "PLEX_URL")]
    server_url: Option<String>,

    /// Server owner's Plex token, overrides the config file
    #[arg(long, env = "PLEX_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Console log level (default: info)
    #[arg(long, default_value = "info", env = "LOG_LEVEL")]
    log_level: log::LevelFilter,

    /// File log level (default: debug)
    #[arg(long, default_value = "debug")]
    log_file_level: log::LevelFilter,

    /// Path to log file
    #[arg(long, env = "PLAYLIST_MIRROR_LOG_FILE")]
    log_file: Option<PathBuf>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    /// Delete every mirror and create nothing
    Clean,
    /// Log planned actions without applying them
    Dryrun,
}

impl Args {
    fn run_mode(&self) -> RunMode {
        RunMode {
            clean: self.modes.contains(&Mode::Clean),
            dry_run: self.modes.contains(&Mode::Dryrun),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    setup_logging(args.log_level, args.log_file.clone(), args.log_file_level)?;

    log::debug!("Loading configuration");
    let config = {
        if let Some(config) = &args.config {
            Config::from_file(config)
        } else {
            Config::load()
        }
    }
    .with_context(|| "Failed to load playlist-mirror config")?;

    let (server_url, token) =
        config.server_credentials(args.server_url.as_deref(), args.token.as_deref())?;
    let mode = args.run_mode();
    if mode.dry_run {
        log::info!("Dry run, no playlists will be changed");
    }
    if mode.clean {
        log::info!("Clean mode, removing all mirrored playlists");
    }

    let client = PlexHttpAdapter::new(
        server_url,
        config.timeout(),
        ServerCompat {
            accept_no_content_on_delete: config.server.accept_no_content_on_delete,
        },
    )?;
    let service = PlaylistSyncService::new(client, token, config.accounts, config.markers);

    let report = service.run(mode).await.wrap_err("Playlist sync aborted")?;

    log::info!(
        "{} accounts, {} source playlists, {} mirrors, {} actions planned",
        report.accounts,
        report.sources,
        report.mirrors,
        report.planned
    );
    let execution = &report.execution;
    log::info!(
        "Created {}, updated {}, deleted {}, skipped {}, failed {}",
        execution.created,
        execution.updated,
        execution.deleted,
        execution.skipped,
        execution.failures.len()
    );

    if !execution.is_success() {
        for failure in &execution.failures {
            log::error!("{} on {}: {}", failure.action, failure.action.target(), failure.error);
        }
        return Err(eyre!(
            "{} of {} actions failed",
            execution.failures.len(),
            report.planned
        ));
    }

    Ok(())
}
