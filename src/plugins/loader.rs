//! Client-side discovery: find every CA bot reachable through the shared store.
//!
//! One listing call enumerates the teams, then each team's record is checked,
//! read and validated on its own. A team whose existence check fails is skipped
//! (the store is eventually consistent and a flaky team must not hide every
//! other bot). A record that lies about its team aborts the whole load.

use crate::core::error::SshcaError;
use crate::core::record::{DedupedView, DiscoveryRecord};
use crate::core::store::{GroupStore, TEAMS_PREFIX, team_config_path};
use rustc_hash::FxHashMap;
use tracing::{debug, warn};

/// Load, validate and deduplicate every team's record.
///
/// Records are keyed by bot name; when two teams carry the same bot, the team
/// enumerated later wins. The store does not promise a stable enumeration
/// order, so which team's copy survives is unspecified.
pub fn load_all(store: &dyn GroupStore) -> Result<DedupedView, SshcaError> {
    // Unlike a single team, an unlistable store cannot degrade to "no bots".
    let listed = store.list(TEAMS_PREFIX)?;

    let mut by_bot: FxHashMap<String, DiscoveryRecord> = FxHashMap::default();
    let mut teams = Vec::new();
    for team in listed {
        let path = team_config_path(&team);
        let exists = match store.exists(&path) {
            Ok(exists) => exists,
            Err(err) => {
                debug!(team = %team, error = %err, "treating unreadable team as having no client config");
                false
            }
        };
        if !exists {
            continue;
        }

        let record = match load_record(store, &path) {
            Ok(record) => record,
            // Retracted between the check and the read.
            Err(SshcaError::StoreError(err)) if err.is_not_found() => {
                debug!(team = %team, "client config disappeared before it could be read");
                continue;
            }
            Err(err) => return Err(err),
        };
        if record.team != team {
            return Err(SshcaError::ValidationError(format!(
                "bad client config at {}, specifies incorrect team name {}",
                path, record.team
            )));
        }

        if let Some(previous) = by_bot.get(&record.bot_name) {
            warn!(
                bot = %record.bot_name,
                kept = %record.team,
                dropped = %previous.team,
                "bot published in more than one team; keeping the later one"
            );
        }
        teams.push(team);
        by_bot.insert(record.bot_name.clone(), record);
    }

    Ok(DedupedView {
        records: by_bot.into_values().collect(),
        teams,
    })
}

/// Read and validate a single record. The path is resolved by the store, which
/// refuses anything outside of it.
pub fn load_record(store: &dyn GroupStore, path: &str) -> Result<DiscoveryRecord, SshcaError> {
    let bytes = store.read(path)?;
    DiscoveryRecord::from_json(&bytes, path)
}

/// Pick the record a client should talk to.
///
/// An explicitly requested team wins, then a lone record, then the client's
/// default team. Anything else is ambiguous and reported with the choices.
pub fn select_record<'a>(
    view: &'a DedupedView,
    requested_team: Option<&str>,
    default_team: Option<&str>,
) -> Result<&'a DiscoveryRecord, SshcaError> {
    if let Some(team) = requested_team {
        return find_team(view, team).ok_or_else(|| {
            SshcaError::NotFound(format!(
                "no CA bot serves team {} (available: {})",
                team,
                available(view)
            ))
        });
    }
    match view.records.as_slice() {
        [] => Err(SshcaError::NotFound(
            "did not find any client configs; is the CA bot running?".to_string(),
        )),
        [only] => Ok(only),
        _ => {
            if let Some(record) = default_team.and_then(|team| find_team(view, team)) {
                return Ok(record);
            }
            Err(SshcaError::ValidationError(format!(
                "found CA bots in multiple teams ({}); pick one with --team or set a default team",
                available(view)
            )))
        }
    }
}

fn find_team<'a>(view: &'a DedupedView, team: &str) -> Option<&'a DiscoveryRecord> {
    view.records.iter().find(|r| r.team == team)
}

fn available(view: &DedupedView) -> String {
    let mut teams = view.records.iter().map(|r| r.team.as_str()).collect::<Vec<_>>();
    teams.sort_unstable();
    teams.join(", ")
}
