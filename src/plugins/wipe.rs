//! Administrative cleanup used by integration harnesses.
//!
//! `wipe_all` removes every team's discovery record, one blocking task per team,
//! joined by a [`TaskGroup`] barrier. It never runs as part of the bot's own
//! lifecycle.

use crate::core::barrier::{TaskGroup, TaskOutcome};
use crate::core::config::BotConfig;
use crate::core::error::{GroupFailure, SshcaError};
use crate::core::store::{GroupStore, StoreError, TEAMS_PREFIX, team_config_path};
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WipeSummary {
    pub teams_scanned: usize,
    /// Teams whose record was deleted by this wipe.
    pub deleted: Vec<String>,
}

/// Delete every team's client config concurrently.
///
/// Per-team failures are printed as they happen and collected; they never stop
/// the other teams. Any failure turns the result into
/// [`SshcaError::PartialFailure`] once every task has finished.
pub async fn wipe_all(store: Arc<dyn GroupStore>) -> Result<WipeSummary, SshcaError> {
    let teams = store.list(TEAMS_PREFIX)?;
    let teams_scanned = teams.len();

    let mut group = TaskGroup::new();
    for team in teams {
        let store = Arc::clone(&store);
        group.spawn_blocking(team.clone(), move || wipe_team(store.as_ref(), &team));
    }

    let outcomes = group
        .join_all(|outcome| match &outcome.result {
            Ok(Err(err)) => println!("{}", err),
            Err(panic) => println!("{}: {}", outcome.label, panic),
            Ok(Ok(_)) => {}
        })
        .await;

    let mut deleted = Vec::new();
    let mut failures = Vec::new();
    for TaskOutcome { label, result } in outcomes {
        match result {
            Ok(Ok(true)) => deleted.push(label),
            Ok(Ok(false)) => {}
            Ok(Err(error)) => failures.push(GroupFailure { group: label, error }),
            Err(panic) => failures.push(GroupFailure {
                error: StoreError::Io {
                    path: team_config_path(&label),
                    source: io::Error::other(panic),
                },
                group: label,
            }),
        }
    }

    info!(
        scanned = teams_scanned,
        deleted = deleted.len(),
        failed = failures.len(),
        "wiped client configs"
    );
    if !failures.is_empty() {
        return Err(SshcaError::PartialFailure(failures));
    }
    Ok(WipeSummary {
        teams_scanned,
        deleted,
    })
}

/// `Ok(true)` when a record was deleted, `Ok(false)` when there was none.
fn wipe_team(store: &dyn GroupStore, team: &str) -> Result<bool, StoreError> {
    let path = team_config_path(team);
    if !store.exists(&path)? {
        return Ok(false);
    }
    match store.delete(&path) {
        Ok(()) => {
            debug!(team = %team, "deleted client config");
            Ok(true)
        }
        // Someone else got there between the check and the delete.
        Err(err) if err.is_not_found() => Ok(false),
        Err(err) => Err(err),
    }
}

/// Delete the CA log file, through the store when it lives on the mount.
pub fn wipe_logs(config: &BotConfig) -> Result<PathBuf, SshcaError> {
    let location = config.log_location.clone().ok_or_else(|| {
        SshcaError::ConfigError("no log_location configured; nothing to wipe".to_string())
    })?;

    let store = config.store();
    let result = match store.store_path_of(&location) {
        Some(store_path) => store.delete(&store_path).map_err(SshcaError::from),
        None => fs::remove_file(&location).map_err(SshcaError::from),
    };
    result.map_err(|e| {
        SshcaError::IoError(io::Error::other(format!(
            "Failed to delete log file at {}: {}",
            location.display(),
            e
        )))
    })?;
    Ok(location)
}
