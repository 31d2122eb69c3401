//! CA key generation and backup export.
//!
//! Key material is produced by `ssh-keygen`; nothing here touches the
//! cryptography itself.

use crate::core::config::BotConfig;
use crate::core::error::SshcaError;
use std::fs;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::info;

const BACKUP_PROMPT: &str = "Are you sure you want to export the CA private key? If this key is compromised, an \
attacker could access every server that you have configured with this bot. Type \"yes\" to confirm.";

/// Generate a fresh ed25519 CA key at the configured location.
pub async fn generate(config: &BotConfig, overwrite: bool) -> Result<PathBuf, SshcaError> {
    let key_path = config.ca_key_location.clone();
    prepare_key_location(&key_path, overwrite)?;

    let output = Command::new("ssh-keygen")
        .args(["-t", "ed25519", "-m", "PEM", "-N", "", "-C"])
        .arg(format!("{} CA", config.bot_name))
        .arg("-f")
        .arg(&key_path)
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| {
            SshcaError::IoError(std::io::Error::new(
                e.kind(),
                format!("Failed to run ssh-keygen: {}", e),
            ))
        })?;
    if !output.status.success() {
        return Err(SshcaError::ValidationError(format!(
            "ssh-keygen failed ({}): {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    info!(path = %key_path.display(), "generated new CA key");
    Ok(key_path)
}

/// Refuse to clobber an existing key unless asked to; clear it out if asked to.
fn prepare_key_location(key_path: &Path, overwrite: bool) -> Result<(), SshcaError> {
    if key_path.exists() {
        if !overwrite {
            return Err(SshcaError::ValidationError(format!(
                "Refusing to overwrite existing CA key at {} (pass --overwrite-existing-key)",
                key_path.display()
            )));
        }
        fs::remove_file(key_path)?;
        let public = public_key_path(key_path);
        if public.exists() {
            fs::remove_file(public)?;
        }
    }
    if let Some(parent) = key_path.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

pub fn public_key_path(key_path: &Path) -> PathBuf {
    let mut name = key_path.as_os_str().to_owned();
    name.push(".pub");
    PathBuf::from(name)
}

/// Ask before the private key leaves the machine. Anything but `yes` aborts.
pub fn confirm_export<R, W>(input: &mut R, out: &mut W) -> Result<(), SshcaError>
where
    R: BufRead,
    W: Write,
{
    writeln!(out, "{}", BACKUP_PROMPT)?;
    out.flush()?;

    let mut response = String::new();
    input.read_line(&mut response)?;
    if response.trim() != "yes" {
        return Err(SshcaError::ValidationError(
            "Did not get confirmation of key export, aborting...".to_string(),
        ));
    }
    Ok(())
}

/// Print the CA private key. Call [`confirm_export`] first.
pub fn export_ca_key<W: Write>(config: &BotConfig, out: &mut W) -> Result<(), SshcaError> {
    let key = fs::read_to_string(&config.ca_key_location).map_err(|e| {
        SshcaError::IoError(std::io::Error::new(
            e.kind(),
            format!(
                "Failed to load the CA key from {}: {}",
                config.ca_key_location.display(),
                e
            ),
        ))
    })?;
    info!(bot = %config.bot_name, "Exported CA key to stdout");

    writeln!(
        out,
        "\nKeep this key somewhere very safe. We recommend keeping a physical copy of it in a secure place.\n"
    )?;
    writeln!(out, "{}", key)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::tempdir;

    fn config(key: &Path) -> BotConfig {
        let mut config: BotConfig =
            toml::from_str("bot_name = \"bot1\"\nteams = [\"eng\"]").unwrap();
        config.ca_key_location = key.to_path_buf();
        config
    }

    #[test]
    fn existing_key_is_kept_without_overwrite() {
        let tmp = tempdir().unwrap();
        let key = tmp.path().join("ca_key");
        fs::write(&key, "secret").unwrap();
        let err = prepare_key_location(&key, false).unwrap_err();
        assert!(err.to_string().contains("Refusing to overwrite"));
        assert_eq!(fs::read_to_string(&key).unwrap(), "secret");
    }

    #[test]
    fn overwrite_clears_key_pair() {
        let tmp = tempdir().unwrap();
        let key = tmp.path().join("keys").join("ca_key");
        prepare_key_location(&key, false).unwrap();
        assert!(key.parent().unwrap().is_dir());

        fs::write(&key, "secret").unwrap();
        fs::write(public_key_path(&key), "pub").unwrap();
        prepare_key_location(&key, true).unwrap();
        assert!(!key.exists());
        assert!(!public_key_path(&key).exists());
    }

    #[test]
    fn export_requires_yes() {
        let mut out = Vec::new();
        let err = confirm_export(&mut Cursor::new("no\n"), &mut out).unwrap_err();
        assert!(err.to_string().contains("Did not get confirmation"));
        assert!(String::from_utf8_lossy(&out).starts_with("Are you sure"));

        confirm_export(&mut Cursor::new("yes\n"), &mut Vec::new()).unwrap();
    }

    #[test]
    fn export_prints_the_key() {
        let tmp = tempdir().unwrap();
        let key = tmp.path().join("ca_key");
        fs::write(&key, "-----KEY-----").unwrap();

        let mut out = Vec::new();
        export_ca_key(&config(&key), &mut out).unwrap();
        assert!(String::from_utf8(out).unwrap().contains("-----KEY-----"));
    }

    #[test]
    fn export_reports_missing_key() {
        let tmp = tempdir().unwrap();
        let config = config(&tmp.path().join("absent"));
        let err = export_ca_key(&config, &mut Vec::new()).unwrap_err();
        assert!(err.to_string().contains("Failed to load the CA key"));
    }
}
