//! Store accessor for the shared team filesystem.
//!
//! Discovery records travel through a networked filesystem that every member of a
//! team can reach (mounted locally, e.g. at `/keybase`). This module exposes the
//! five primitives the rest of the crate depends on through [`GroupStore`] and
//! ships [`FsStore`], the implementation over a mounted directory tree.
//!
//! Store paths are `/`-separated and relative to the mount:
//! `team/<team>/kssh-client.config`. Timeouts and retries belong to the mount
//! itself; nothing here retries.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// Directory under the mount holding one subdirectory per team.
pub const TEAMS_PREFIX: &str = "team";
/// File name of the discovery record inside each team directory.
pub const CLIENT_CONFIG_FILENAME: &str = "kssh-client.config";
/// Default mount point of the shared filesystem.
pub const DEFAULT_STORE_MOUNT: &str = "/keybase";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("{path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("path {0} is outside of the store")]
    OutsideStore(String),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }

    fn from_io(path: &str, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            StoreError::NotFound(path.to_string())
        } else {
            StoreError::Io {
                path: path.to_string(),
                source,
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteOptions {
    /// Append to the existing content instead of replacing it.
    pub append: bool,
}

impl WriteOptions {
    pub fn overwrite() -> Self {
        Self { append: false }
    }

    pub fn append() -> Self {
        Self { append: true }
    }
}

/// The read/write/list/delete/exists primitives of the shared store.
///
/// Implementations must be shareable across the bulk-wipe fan-out, so every
/// method takes `&self`.
pub trait GroupStore: Send + Sync {
    /// Names of the entries directly under `prefix`.
    fn list(&self, prefix: &str) -> Result<Vec<String>, StoreError>;
    fn exists(&self, path: &str) -> Result<bool, StoreError>;
    fn read(&self, path: &str) -> Result<Vec<u8>, StoreError>;
    fn write(&self, path: &str, content: &[u8], opts: WriteOptions) -> Result<(), StoreError>;
    /// Fails with [`StoreError::NotFound`] when nothing is stored at `path`.
    fn delete(&self, path: &str) -> Result<(), StoreError>;
}

/// Deterministic store path of a team's discovery record.
pub fn team_config_path(team: &str) -> String {
    format!("{}/{}/{}", TEAMS_PREFIX, team, CLIENT_CONFIG_FILENAME)
}

/// Store backed by a mounted directory tree.
#[derive(Debug, Clone)]
pub struct FsStore {
    /// Absolute path where the shared filesystem is mounted.
    pub mount: PathBuf,
}

impl FsStore {
    pub fn new(mount: impl Into<PathBuf>) -> Self {
        Self {
            mount: mount.into(),
        }
    }

    /// Map a store path onto the mount, refusing anything that could escape it.
    pub fn resolve(&self, path: &str) -> Result<PathBuf, StoreError> {
        let relative = path.trim_start_matches('/');
        let mut resolved = self.mount.clone();
        for component in Path::new(relative).components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::CurDir => {}
                _ => return Err(StoreError::OutsideStore(path.to_string())),
            }
        }
        Ok(resolved)
    }

    /// Inverse of [`FsStore::resolve`] for local paths that live under the mount.
    pub fn store_path_of(&self, local: &Path) -> Option<String> {
        let relative = local.strip_prefix(&self.mount).ok()?;
        let parts = relative
            .components()
            .map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy().to_string()),
                _ => None,
            })
            .collect::<Option<Vec<_>>>()?;
        if parts.is_empty() {
            None
        } else {
            Some(parts.join("/"))
        }
    }
}

impl GroupStore for FsStore {
    fn list(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let dir = self.resolve(prefix)?;
        let entries = fs::read_dir(&dir).map_err(|e| StoreError::from_io(prefix, e))?;
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::from_io(prefix, e))?;
            names.push(entry.file_name().to_string_lossy().to_string());
        }
        Ok(names)
    }

    fn exists(&self, path: &str) -> Result<bool, StoreError> {
        let local = self.resolve(path)?;
        match local.try_exists() {
            Ok(exists) => Ok(exists),
            // A stray file where a team directory should be.
            Err(e) if e.kind() == io::ErrorKind::NotADirectory => Ok(false),
            Err(e) => Err(StoreError::from_io(path, e)),
        }
    }

    fn read(&self, path: &str) -> Result<Vec<u8>, StoreError> {
        let local = self.resolve(path)?;
        fs::read(&local).map_err(|e| StoreError::from_io(path, e))
    }

    fn write(&self, path: &str, content: &[u8], opts: WriteOptions) -> Result<(), StoreError> {
        let local = self.resolve(path)?;
        if let Some(parent) = local.parent() {
            fs::create_dir_all(parent).map_err(|e| StoreError::from_io(path, e))?;
        }

        if opts.append {
            let mut file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&local)
                .map_err(|e| StoreError::from_io(path, e))?;
            return file
                .write_all(content)
                .map_err(|e| StoreError::from_io(path, e));
        }

        // Readers must never observe a half-written record.
        let file_name = local
            .file_name()
            .ok_or_else(|| StoreError::OutsideStore(path.to_string()))?
            .to_string_lossy()
            .to_string();
        let tmp = local.with_file_name(format!(".{}.tmp-{}", file_name, std::process::id()));
        fs::write(&tmp, content).map_err(|e| StoreError::from_io(path, e))?;
        fs::rename(&tmp, &local).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            StoreError::from_io(path, e)
        })
    }

    fn delete(&self, path: &str) -> Result<(), StoreError> {
        let local = self.resolve(path)?;
        fs::remove_file(&local).map_err(|e| StoreError::from_io(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn team_config_path_is_deterministic() {
        assert_eq!(team_config_path("eng"), "team/eng/kssh-client.config");
    }

    #[test]
    fn resolve_rejects_parent_components() {
        let store = FsStore::new("/mnt/shared");
        assert_eq!(
            store.resolve("/team/eng/kssh-client.config").unwrap(),
            PathBuf::from("/mnt/shared/team/eng/kssh-client.config")
        );
        assert!(matches!(
            store.resolve("team/../../etc/passwd"),
            Err(StoreError::OutsideStore(_))
        ));
    }

    #[test]
    fn store_path_of_round_trips_under_mount() {
        let store = FsStore::new("/mnt/shared");
        assert_eq!(
            store.store_path_of(Path::new("/mnt/shared/team/eng/ca.log")),
            Some("team/eng/ca.log".to_string())
        );
        assert_eq!(store.store_path_of(Path::new("/var/log/ca.log")), None);
        assert_eq!(store.store_path_of(Path::new("/mnt/shared")), None);
    }

    #[test]
    fn write_overwrites_and_appends() {
        let tmp = tempdir().unwrap();
        let store = FsStore::new(tmp.path());
        store
            .write("team/eng/file", b"first", WriteOptions::overwrite())
            .unwrap();
        store
            .write("team/eng/file", b"second", WriteOptions::overwrite())
            .unwrap();
        assert_eq!(store.read("team/eng/file").unwrap(), b"second");

        store
            .write("team/eng/file", b"+more", WriteOptions::append())
            .unwrap();
        assert_eq!(store.read("team/eng/file").unwrap(), b"second+more");

        // no temp files left behind
        assert_eq!(store.list("team/eng").unwrap(), vec!["file".to_string()]);
    }

    #[test]
    fn missing_paths_report_not_found() {
        let tmp = tempdir().unwrap();
        let store = FsStore::new(tmp.path());
        assert!(!store.exists("team/eng/file").unwrap());
        assert!(store.read("team/eng/file").unwrap_err().is_not_found());
        assert!(store.delete("team/eng/file").unwrap_err().is_not_found());
        assert!(store.list("team").unwrap_err().is_not_found());
    }

    #[test]
    fn path_through_a_file_does_not_exist() {
        let tmp = tempdir().unwrap();
        let store = FsStore::new(tmp.path());
        fs::create_dir_all(tmp.path().join("team")).unwrap();
        fs::write(tmp.path().join("team/README"), "not a team").unwrap();
        assert!(!store.exists(&team_config_path("README")).unwrap());
    }
}
