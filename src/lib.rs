//! sshca: discovery plumbing for an SSH certificate-authority bot.
//!
//! The bot serves one or more teams. Each team has a directory in a shared,
//! eventually-consistent filesystem (the store) that every team member can read.
//! The bot drops a small client config into each of those directories while it
//! runs, and clients scan the store to find out which bot to talk to.
//!
//! # Architecture
//!
//! - [`core::store`]: the five store primitives and the mounted-filesystem store
//! - [`core::record`]: record schemas (`kssh-client.config`, local default team)
//! - [`plugins::publisher`]: write/delete one record per served team
//! - [`plugins::loader`]: enumerate, validate and deduplicate records
//! - [`plugins::lifecycle`]: publish on start, retract on every way out
//! - [`plugins::wipe`]: concurrent administrative wipe
//!
//! # Guarantees and limits
//!
//! Every successful publish is followed by one retract attempt, whether the
//! workload finishes, fails, or the process receives SIGINT/SIGTERM. A process
//! that is killed outright leaves its records behind; they are overwritten by
//! the next publish to the same team or removed with `--wipe-all-configs`.
//! There is no locking: two bots publishing to one team race and the last
//! write wins.
//!
//! # Examples
//!
//! ```bash
//! # Run the bot for the teams in ~/.config/sshca/config.toml
//! sshca service
//!
//! # On a client: which bots can I reach?
//! sshca discover
//! sshca set-default-team eng.ssh
//! ```

pub mod core;
pub mod plugins;

mod cli;

use crate::cli::{Cli, Command};
use crate::core::config::{self, BotConfig, ClientSettings};
use crate::core::error::SshcaError;
use crate::core::store::GroupStore;
use crate::core::{logging, output};
use crate::plugins::lifecycle::{self, Lifecycle};
use crate::plugins::{default_team, keys, loader, service, wipe};
use clap::Parser;
use std::path::Path;
use std::sync::Arc;

pub fn run() -> Result<(), SshcaError> {
    let cli = Cli::parse();
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(SshcaError::IoError)?;
    runtime.block_on(dispatch(cli))
}

async fn dispatch(cli: Cli) -> Result<(), SshcaError> {
    let config_path = cli.config.clone().unwrap_or_else(config::default_config_location);

    if cli.wipe_all_configs || cli.wipe_logs {
        logging::init(None)?;
        // Per-team failures are already printed; the log wipe still runs.
        let configs_wiped = if cli.wipe_all_configs {
            run_wipe_all(&ClientSettings::from_env()).await
        } else {
            Ok(())
        };
        if cli.wipe_logs {
            let config = config::load_config(&config_path)?;
            let wiped = wipe::wipe_logs(&config)?;
            println!("Wiped existing log file at {}", wiped.display());
        }
        configs_wiped?;
    }

    let Some(command) = cli.command else {
        return Ok(());
    };

    match command {
        Command::Backup => {
            let stdout = std::io::stdout();
            keys::confirm_export(&mut std::io::stdin().lock(), &mut stdout.lock())?;
            let config = load_bot_config(&config_path)?;
            keys::export_ca_key(&config, &mut stdout.lock())
        }
        Command::Generate {
            overwrite_existing_key,
        } => {
            let config = load_bot_config(&config_path)?;
            let overwrite = overwrite_existing_key || BotConfig::force_write_from_env();
            let workload = async {
                keys::generate(&config, overwrite).await.map(|_| ()).map_err(|e| {
                    SshcaError::ValidationError(format!("Failed to generate a new key: {}", e))
                })
            };
            serve_with_lifecycle(&config, workload).await
        }
        Command::Service => {
            let config = load_bot_config(&config_path)?;
            serve_with_lifecycle(&config, service::run_service(&config)).await
        }
        Command::Discover { format } => {
            logging::init(None)?;
            let settings = ClientSettings::from_env();
            let view = loader::load_all(&settings.store())?;
            if format == "json" {
                let body = serde_json::json!({
                    "records": view.records,
                    "teams": view.teams,
                });
                println!("{}", body);
            } else {
                println!("{}", output::render_view(&view));
            }
            Ok(())
        }
        Command::Select { team } => {
            logging::init(None)?;
            let settings = ClientSettings::from_env();
            let view = loader::load_all(&settings.store())?;
            let default = default_team::get_default_team(&settings)?;
            let record = loader::select_record(&view, team.as_deref(), default.as_deref())?;
            let body = serde_json::to_string(record)
                .map_err(|e| SshcaError::ValidationError(e.to_string()))?;
            println!("{}", body);
            Ok(())
        }
        Command::SetDefaultTeam { team } => {
            let settings = ClientSettings::from_env();
            default_team::set_default_team(&settings, &team)?;
            println!("Set default team to {}", team);
            Ok(())
        }
        Command::DefaultTeam => {
            let settings = ClientSettings::from_env();
            match default_team::get_default_team(&settings)? {
                Some(team) => println!("{}", team),
                None => println!("No default team set"),
            }
            Ok(())
        }
    }
}

fn load_bot_config(path: &Path) -> Result<BotConfig, SshcaError> {
    let config = config::load_config(path)?;
    logging::init(config.log_location.as_deref())?;
    Ok(config)
}

async fn serve_with_lifecycle<W>(config: &BotConfig, workload: W) -> Result<(), SshcaError>
where
    W: std::future::Future<Output = Result<(), SshcaError>>,
{
    let store: Arc<dyn GroupStore> = Arc::new(config.store());
    let mut lifecycle = Lifecycle::new(
        store,
        config.teams.clone(),
        config.bot_name.clone(),
        config.channel_name.clone(),
    );
    lifecycle
        .run(workload, lifecycle::shutdown_signal())
        .await
        .map(|_| ())
}

async fn run_wipe_all(settings: &ClientSettings) -> Result<(), SshcaError> {
    let store: Arc<dyn GroupStore> = Arc::new(settings.store());
    let summary = wipe::wipe_all(store).await?;
    println!(
        "Wiped {} client config(s) across {} team(s)",
        summary.deleted.len(),
        summary.teams_scanned
    );
    Ok(())
}
