//! Record schemas shared by the bot and its clients.

use crate::core::error::SshcaError;
use serde::{Deserialize, Serialize};

/// Discovery record the bot publishes into each team it serves.
///
/// Serialized as `{"teamname": .., "channelname": .., "botname": ..}`. Unknown
/// fields are ignored; missing fields deserialize empty and are caught by
/// [`DiscoveryRecord::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryRecord {
    #[serde(rename = "teamname", default)]
    pub team: String,
    #[serde(rename = "channelname", default)]
    pub channel: String,
    #[serde(rename = "botname", default)]
    pub bot_name: String,
}

impl DiscoveryRecord {
    pub fn new(team: &str, channel: &str, bot_name: &str) -> Self {
        Self {
            team: team.to_string(),
            channel: channel.to_string(),
            bot_name: bot_name.to_string(),
        }
    }

    pub fn to_json(&self) -> Result<Vec<u8>, SshcaError> {
        serde_json::to_vec(self)
            .map_err(|e| SshcaError::ValidationError(format!("cannot encode record: {}", e)))
    }

    /// Parse and validate raw record bytes read from `source`.
    pub fn from_json(bytes: &[u8], source: &str) -> Result<Self, SshcaError> {
        let record: DiscoveryRecord = serde_json::from_slice(bytes).map_err(|e| {
            SshcaError::ValidationError(format!("malformed client config at {}: {}", source, e))
        })?;
        record.validate(source)?;
        Ok(record)
    }

    pub fn validate(&self, source: &str) -> Result<(), SshcaError> {
        if self.team.is_empty() || self.bot_name.is_empty() {
            return Err(SshcaError::ValidationError(format!(
                "client config at {} is missing data (teamname={:?}, botname={:?})",
                source, self.team, self.bot_name
            )));
        }
        Ok(())
    }
}

/// Loader output: records unique by bot name plus every team that held a valid record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DedupedView {
    pub records: Vec<DiscoveryRecord>,
    pub teams: Vec<String>,
}

impl DedupedView {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Client-local preference for which team's bot to use.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalDefaultTeam {
    #[serde(rename = "default_team", default)]
    pub default_team: String,
}
