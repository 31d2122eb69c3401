//! Client-local default team, used when several teams run a CA bot.

use crate::core::config::ClientSettings;
use crate::core::error::SshcaError;
use crate::core::record::LocalDefaultTeam;
use std::fs;

/// Persist `team` as the default. Overwrites any previous choice.
pub fn set_default_team(settings: &ClientSettings, team: &str) -> Result<(), SshcaError> {
    if team.trim().is_empty() {
        return Err(SshcaError::ValidationError(
            "default team must not be empty".to_string(),
        ));
    }
    let body = serde_json::to_vec(&LocalDefaultTeam {
        default_team: team.to_string(),
    })
    .map_err(|e| SshcaError::ValidationError(e.to_string()))?;

    let path = &settings.local_config_path;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, body)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    }
    Ok(())
}

/// The saved default team, or `None` when none was ever set.
pub fn get_default_team(settings: &ClientSettings) -> Result<Option<String>, SshcaError> {
    let path = &settings.local_config_path;
    if !path.exists() {
        return Ok(None);
    }
    let bytes = fs::read(path)?;
    let local: LocalDefaultTeam = serde_json::from_slice(&bytes).map_err(|e| {
        SshcaError::ValidationError(format!("malformed local config {}: {}", path.display(), e))
    })?;
    Ok(Some(local.default_team).filter(|t| !t.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn settings(dir: &std::path::Path) -> ClientSettings {
        ClientSettings {
            store_mount: dir.join("mount"),
            local_config_path: dir.join(".ssh").join("kssh.config"),
        }
    }

    #[test]
    fn unset_default_is_none() {
        let tmp = tempdir().unwrap();
        assert_eq!(get_default_team(&settings(tmp.path())).unwrap(), None);
    }

    #[test]
    fn set_then_get_and_overwrite() {
        let tmp = tempdir().unwrap();
        let settings = settings(tmp.path());
        set_default_team(&settings, "eng").unwrap();
        assert_eq!(get_default_team(&settings).unwrap().as_deref(), Some("eng"));
        set_default_team(&settings, "ops").unwrap();
        assert_eq!(get_default_team(&settings).unwrap().as_deref(), Some("ops"));

        let raw = fs::read_to_string(&settings.local_config_path).unwrap();
        assert_eq!(raw, r#"{"default_team":"ops"}"#);
    }

    #[cfg(unix)]
    #[test]
    fn local_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;
        let tmp = tempdir().unwrap();
        let settings = settings(tmp.path());
        set_default_team(&settings, "eng").unwrap();
        let mode = fs::metadata(&settings.local_config_path)
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let tmp = tempdir().unwrap();
        let settings = settings(tmp.path());
        fs::create_dir_all(settings.local_config_path.parent().unwrap()).unwrap();
        fs::write(&settings.local_config_path, "{").unwrap();
        assert!(get_default_team(&settings).is_err());
    }

    #[test]
    fn empty_team_is_rejected() {
        let tmp = tempdir().unwrap();
        assert!(set_default_team(&settings(tmp.path()), "").is_err());
    }
}
