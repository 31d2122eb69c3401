//! Publishes and retracts the bot's discovery record in every team it serves.
//!
//! There are no transactions in the store: a publish that fails halfway leaves
//! the teams written so far in place, and the caller treats the whole publish
//! as failed.

use crate::core::error::SshcaError;
use crate::core::record::DiscoveryRecord;
use crate::core::store::{GroupStore, WriteOptions, team_config_path};
use tracing::{debug, info, warn};

/// Write one record per team, overwriting whatever was there. Stops at the first failure.
pub fn publish(
    store: &dyn GroupStore,
    teams: &[String],
    bot_name: &str,
    channel: &str,
) -> Result<(), SshcaError> {
    for team in teams {
        let record = DiscoveryRecord::new(team, channel, bot_name);
        record.validate(team)?;
        let path = team_config_path(team);
        store.write(&path, &record.to_json()?, WriteOptions::overwrite())?;
        debug!(team = %team, path = %path, "published client config");
    }
    info!(bot = %bot_name, teams = teams.len(), "published client configs");
    Ok(())
}

/// Delete every team's record. Missing records count as already retracted.
///
/// Every team is attempted; the first error is returned after the loop.
pub fn retract(store: &dyn GroupStore, teams: &[String]) -> Result<(), SshcaError> {
    let mut first_error = None;
    for team in teams {
        let path = team_config_path(team);
        match store.delete(&path) {
            Ok(()) => debug!(team = %team, "retracted client config"),
            Err(err) if err.is_not_found() => debug!(team = %team, "no client config to retract"),
            Err(err) => {
                warn!(team = %team, error = %err, "failed to retract client config");
                first_error.get_or_insert(err);
            }
        }
    }
    match first_error {
        Some(err) => Err(err.into()),
        None => Ok(()),
    }
}
