//! Bot and client configuration.
//!
//! The bot reads a TOML file (`~/.config/sshca/config.toml` unless `--config`
//! says otherwise); a few fields can be overridden from the environment so test
//! harnesses can point the same file at a different bot account or mount.
//! Clients need no file: [`ClientSettings`] is built from the environment and
//! passed explicitly to every client call.

use crate::core::error::SshcaError;
use crate::core::store::{DEFAULT_STORE_MOUNT, FsStore};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

pub const BOT_NAME_ENV: &str = "SSHCA_BOT_NAME";
pub const STORE_MOUNT_ENV: &str = "SSHCA_STORE_MOUNT";
pub const FORCE_WRITE_ENV: &str = "SSHCA_FORCE_WRITE";
pub const LOCAL_CONFIG_ENV: &str = "SSHCA_LOCAL_CONFIG";

const DEFAULT_CONFIG_LOCATION: &str = "~/.config/sshca/config.toml";
const DEFAULT_CA_KEY_LOCATION: &str = "~/.sshca/ca_key";
const DEFAULT_LOCAL_CONFIG_LOCATION: &str = "~/.ssh/kssh.config";
const TEAM_NAME_PATTERN: &str = r"^[a-z0-9][a-z0-9_.]*$";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotConfig {
    /// Account name the bot runs as; becomes `botname` in every record.
    #[serde(default)]
    pub bot_name: String,
    /// Teams the bot is authoritative for.
    #[serde(default)]
    pub teams: Vec<String>,
    #[serde(default)]
    pub channel_name: String,
    #[serde(default = "default_store_mount")]
    pub store_mount: PathBuf,
    #[serde(default = "default_ca_key_location")]
    pub ca_key_location: PathBuf,
    /// CA audit log. May live inside the store mount.
    #[serde(default)]
    pub log_location: Option<PathBuf>,
    /// External chat-bot process run by `sshca service`, argv style.
    #[serde(default)]
    pub service_command: Option<Vec<String>>,
}

fn default_store_mount() -> PathBuf {
    PathBuf::from(DEFAULT_STORE_MOUNT)
}

fn default_ca_key_location() -> PathBuf {
    PathBuf::from(DEFAULT_CA_KEY_LOCATION)
}

pub fn default_config_location() -> PathBuf {
    expand_tilde(Path::new(DEFAULT_CONFIG_LOCATION))
}

/// Replace a leading `~` with `$HOME`. Paths without one are returned unchanged.
pub fn expand_tilde(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    match std::env::var_os("HOME") {
        Some(home) => PathBuf::from(home).join(rest),
        None => path.to_path_buf(),
    }
}

/// Load, override and validate the bot config at `path`.
pub fn load_config(path: &Path) -> Result<BotConfig, SshcaError> {
    if !path.exists() {
        return Err(SshcaError::ConfigError(format!(
            "Config file at {} does not exist",
            path.display()
        )));
    }
    let content = fs::read_to_string(path).map_err(SshcaError::IoError)?;
    let mut config: BotConfig = toml::from_str(&content).map_err(|e| {
        SshcaError::ConfigError(format!("Failed to parse config file {}: {}", path.display(), e))
    })?;
    config.apply_overrides(|key| std::env::var(key).ok());
    config.expand_paths();
    config.validate()?;
    Ok(config)
}

impl BotConfig {
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(name) = lookup(BOT_NAME_ENV).filter(|v| !v.is_empty()) {
            self.bot_name = name;
        }
        if let Some(mount) = lookup(STORE_MOUNT_ENV).filter(|v| !v.is_empty()) {
            self.store_mount = PathBuf::from(mount);
        }
    }

    fn expand_paths(&mut self) {
        self.store_mount = expand_tilde(&self.store_mount);
        self.ca_key_location = expand_tilde(&self.ca_key_location);
        self.log_location = self.log_location.as_deref().map(expand_tilde);
    }

    pub fn validate(&self) -> Result<(), SshcaError> {
        if self.bot_name.trim().is_empty() {
            return Err(SshcaError::ConfigError(format!(
                "bot_name is required (set it in the config file or via {})",
                BOT_NAME_ENV
            )));
        }
        if self.teams.is_empty() {
            return Err(SshcaError::ConfigError(
                "at least one team must be configured".to_string(),
            ));
        }
        let pattern = Regex::new(TEAM_NAME_PATTERN)
            .map_err(|e| SshcaError::ConfigError(format!("invalid team pattern: {}", e)))?;
        let mut seen = HashSet::new();
        for team in &self.teams {
            if !pattern.is_match(team) {
                return Err(SshcaError::ConfigError(format!(
                    "invalid team name {:?}: expected lowercase letters, digits, '_' or '.'",
                    team
                )));
            }
            if !seen.insert(team.as_str()) {
                return Err(SshcaError::ConfigError(format!(
                    "team {:?} is listed more than once",
                    team
                )));
            }
        }
        Ok(())
    }

    pub fn store(&self) -> FsStore {
        FsStore::new(&self.store_mount)
    }

    /// Honour the force-write environment switch used by unattended installs.
    pub fn force_write_from_env() -> bool {
        std::env::var(FORCE_WRITE_ENV)
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false)
    }
}

/// Everything a client call site needs, resolved once and passed down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub store_mount: PathBuf,
    /// Local file holding the client's default team.
    pub local_config_path: PathBuf,
}

impl ClientSettings {
    pub fn from_env() -> Self {
        let store_mount = std::env::var_os(STORE_MOUNT_ENV)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_store_mount);
        let local_config_path = std::env::var_os(LOCAL_CONFIG_ENV)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| expand_tilde(Path::new(DEFAULT_LOCAL_CONFIG_LOCATION)));
        Self {
            store_mount,
            local_config_path,
        }
    }

    pub fn store(&self) -> FsStore {
        FsStore::new(&self.store_mount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample() -> BotConfig {
        toml::from_str(
            r#"
bot_name = "cabot"
teams = ["eng.ssh", "ops"]
channel_name = "ssh-provision"
"#,
        )
        .unwrap()
    }

    #[test]
    fn defaults_fill_optional_fields() {
        let config = sample();
        assert_eq!(config.store_mount, PathBuf::from("/keybase"));
        assert_eq!(config.log_location, None);
        assert_eq!(config.service_command, None);
        config.validate().unwrap();
    }

    #[test]
    fn env_overrides_replace_name_and_mount() {
        let mut config = sample();
        config.apply_overrides(|key| match key {
            BOT_NAME_ENV => Some("otherbot".to_string()),
            STORE_MOUNT_ENV => Some("/tmp/mount".to_string()),
            _ => None,
        });
        assert_eq!(config.bot_name, "otherbot");
        assert_eq!(config.store_mount, PathBuf::from("/tmp/mount"));

        config.apply_overrides(|_| Some(String::new()));
        assert_eq!(config.bot_name, "otherbot");
    }

    #[test]
    fn validate_rejects_bad_team_sets() {
        let mut config = sample();
        config.teams = vec![];
        assert!(config.validate().is_err());

        config.teams = vec!["../etc".to_string()];
        assert!(config.validate().is_err());

        config.teams = vec!["eng".to_string(), "eng".to_string()];
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("more than once"));

        let mut nameless = sample();
        nameless.bot_name = " ".to_string();
        assert!(nameless.validate().is_err());
    }

    #[test]
    fn load_config_reports_missing_file() {
        let tmp = tempdir().unwrap();
        let err = load_config(&tmp.path().join("nope.toml")).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn load_config_reports_parse_errors() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "teams = 3").unwrap();
        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn expand_tilde_leaves_plain_paths() {
        assert_eq!(expand_tilde(Path::new("/etc/x")), PathBuf::from("/etc/x"));
    }
}
