//! Snapshot file on disk.
//!
//! Writes go to a sibling temporary file which is synced and then renamed
//! over the target, so a crash mid-write never leaves a torn snapshot.

use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::{PersistedSnapshot, SNAPSHOT_VERSION};
use crate::error::PersistError;

/// Location of the persisted engine state.
#[derive(Debug, Clone)]
pub struct SnapshotFile {
    path: PathBuf,
}

impl SnapshotFile {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "snapshot".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// Atomically replace the snapshot on disk.
    pub fn save(&self, snapshot: &PersistedSnapshot) -> Result<(), PersistError> {
        let json = serde_json::to_vec_pretty(snapshot).map_err(PersistError::Encode)?;

        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(PersistError::io(dir))?;
        }

        let tmp = self.temp_path();
        {
            let mut file = File::create(&tmp).map_err(PersistError::io(&tmp))?;
            file.write_all(&json).map_err(PersistError::io(&tmp))?;
            file.sync_all().map_err(PersistError::io(&tmp))?;
        }
        fs::rename(&tmp, &self.path).map_err(PersistError::io(&self.path))?;

        debug!("Snapshot written to {}", self.path.display());
        Ok(())
    }

    /// Read the snapshot, distinguishing "nothing saved yet" from failure.
    pub fn try_load(&self) -> Result<Option<PersistedSnapshot>, PersistError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(PersistError::io(&self.path)(e)),
        };

        let snapshot: PersistedSnapshot =
            serde_json::from_slice(&bytes).map_err(PersistError::Decode)?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(PersistError::UnsupportedVersion(snapshot.version));
        }
        Ok(Some(snapshot))
    }

    /// Read the snapshot, falling back to an empty one on any problem.
    pub fn load(&self) -> PersistedSnapshot {
        match self.try_load() {
            Ok(Some(snapshot)) => {
                info!(
                    "Restored {} channels from {}",
                    snapshot.channels.len(),
                    self.path.display()
                );
                snapshot
            }
            Ok(None) => {
                info!("No snapshot at {}, starting empty", self.path.display());
                PersistedSnapshot::default()
            }
            Err(e) => {
                warn!("Ignoring snapshot at {}: {}", self.path.display(), e);
                PersistedSnapshot::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Channel, ReadingStore};
    use std::time::{Duration, UNIX_EPOCH};

    fn sample() -> PersistedSnapshot {
        let mut store = ReadingStore::new();
        store.update(Channel::Temperature, 21.4, UNIX_EPOCH + Duration::from_secs(1_000));
        store.update(Channel::Co2, 612.0, UNIX_EPOCH + Duration::from_secs(1_010));
        PersistedSnapshot {
            channels: store.records().clone(),
            ..PersistedSnapshot::default()
        }
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let file = SnapshotFile::new(dir.path().join("nested").join("state.json"));

        file.save(&sample()).unwrap();
        assert_eq!(file.load(), sample());
        assert!(!file.temp_path().exists());
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let file = SnapshotFile::new(dir.path().join("state.json"));

        assert!(file.try_load().unwrap().is_none());
        assert!(file.load().is_empty());
    }

    #[test]
    fn test_corrupt_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "{ not json").unwrap();

        let file = SnapshotFile::new(&path);
        assert!(matches!(file.try_load(), Err(PersistError::Decode(_))));
        assert!(file.load().is_empty());
    }

    #[test]
    fn test_rejects_unknown_version() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, r#"{"version": 99}"#).unwrap();

        let file = SnapshotFile::new(&path);
        assert!(matches!(
            file.try_load(),
            Err(PersistError::UnsupportedVersion(99))
        ));
    }
}
