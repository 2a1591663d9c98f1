//! Manifest snapshots before batch updates
//!
//! A snapshot copies every manifest and lock file into a timestamped
//! directory under `.depsentry/backups/`. The metadata file is written
//! last, so its presence marks the snapshot as complete; directories
//! without metadata are treated as garbage from an interrupted run.

use crate::error::BackupError;
use crate::manifest;
use crate::persist;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const METADATA_FILE: &str = "backup_metadata.json";

/// Metadata describing one complete snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupMetadata {
    /// Snapshot id (also the directory name)
    pub id: String,
    /// File names contained in the snapshot
    pub files: Vec<String>,
    /// Project root the files came from
    pub source_root: PathBuf,
    /// When the snapshot was taken
    pub created_at: DateTime<Utc>,
}

/// A complete snapshot found on disk
#[derive(Debug, Clone)]
pub struct BackupInfo {
    /// Snapshot id
    pub id: String,
    /// Directory holding the snapshot
    pub path: PathBuf,
    /// Parsed metadata
    pub metadata: BackupMetadata,
}

/// Creates, lists and restores manifest snapshots for one project root
pub struct BackupManager {
    root: PathBuf,
    backup_dir: PathBuf,
}

impl BackupManager {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let backup_dir = root.join(".depsentry").join("backups");
        Self { root, backup_dir }
    }

    /// Returns the directory snapshots are stored under
    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    /// Snapshots every manifest and lock file in the project root
    ///
    /// Returns the new snapshot id. Fails (and removes the partial
    /// directory) when any file cannot be copied.
    pub fn snapshot(&self) -> Result<String, BackupError> {
        let targets = manifest::backup_targets(&self.root);
        std::fs::create_dir_all(&self.backup_dir)
            .map_err(|e| BackupError::io(&self.backup_dir, e))?;
        let (id, dir) = self.claim_snapshot_dir()?;

        let mut files = Vec::new();
        for target in &targets {
            let Some(name) = target.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let dest = dir.join(name);
            if let Err(e) = std::fs::copy(target, &dest) {
                // Leave no half-written snapshot behind
                let _ = std::fs::remove_dir_all(&dir);
                return Err(BackupError::io(target, e));
            }
            files.push(name.to_string());
        }

        let metadata = BackupMetadata {
            id: id.clone(),
            files,
            source_root: self.root.clone(),
            created_at: Utc::now(),
        };
        // Written last: metadata presence marks the snapshot complete
        persist::write_json_atomic(&dir.join(METADATA_FILE), &metadata)
            .map_err(|e| BackupError::io(dir.join(METADATA_FILE), e))?;

        info!(id = %id, files = metadata.files.len(), "created backup");
        Ok(id)
    }

    /// Creates a uniquely named snapshot directory
    ///
    /// Two snapshots within the same second would share a timestamp id;
    /// the later one gets a numeric suffix.
    fn claim_snapshot_dir(&self) -> Result<(String, PathBuf), BackupError> {
        let base = format!("backup_{}", Utc::now().format("%Y%m%d_%H%M%S"));
        let mut id = base.clone();
        let mut attempt = 1;
        loop {
            let dir = self.backup_dir.join(&id);
            match std::fs::create_dir(&dir) {
                Ok(()) => return Ok((id, dir)),
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    attempt += 1;
                    id = format!("{}_{}", base, attempt);
                }
                Err(e) => return Err(BackupError::io(&dir, e)),
            }
        }
    }

    /// Restores a snapshot over the project root
    ///
    /// Every file listed in the metadata must exist in the snapshot
    /// before anything is copied; an incomplete snapshot restores
    /// nothing. Returns the number of files restored.
    pub fn restore(&self, id: &str) -> Result<usize, BackupError> {
        let dir = self.backup_dir.join(id);
        if !dir.is_dir() {
            return Err(BackupError::not_found(id));
        }
        let metadata = self.read_metadata(id, &dir)?;

        for file in &metadata.files {
            if !dir.join(file).is_file() {
                return Err(BackupError::incomplete(id, file.clone()));
            }
        }

        for file in &metadata.files {
            let source = dir.join(file);
            let dest = self.root.join(file);
            std::fs::copy(&source, &dest).map_err(|e| BackupError::io(&dest, e))?;
        }
        info!(id, files = metadata.files.len(), "restored backup");
        Ok(metadata.files.len())
    }

    /// Lists complete snapshots, newest first
    ///
    /// Directories without metadata are skipped with a warning.
    pub fn list_backups(&self) -> Vec<BackupInfo> {
        let Ok(entries) = std::fs::read_dir(&self.backup_dir) else {
            return Vec::new();
        };

        let mut backups = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let id = entry.file_name().to_string_lossy().into_owned();
            match self.read_metadata(&id, &path) {
                Ok(metadata) => backups.push(BackupInfo { id, path, metadata }),
                Err(e) => {
                    warn!(id, error = %e, "skipping unusable backup directory");
                }
            }
        }
        backups.sort_by(|a, b| b.id.cmp(&a.id));
        backups
    }

    fn read_metadata(&self, id: &str, dir: &Path) -> Result<BackupMetadata, BackupError> {
        let path = dir.join(METADATA_FILE);
        if !path.is_file() {
            return Err(BackupError::metadata_missing(id));
        }
        let content = std::fs::read_to_string(&path).map_err(|e| BackupError::io(&path, e))?;
        serde_json::from_str(&content).map_err(|e| BackupError::MetadataParse {
            id: id.to_string(),
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project_with_manifests() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("package.json"),
            r#"{"dependencies": {"express": "^4.18.2"}}"#,
        )
        .unwrap();
        std::fs::write(dir.path().join("requirements.txt"), "requests==2.25.1\n").unwrap();
        dir
    }

    #[test]
    fn test_snapshot_copies_manifests() {
        let dir = project_with_manifests();
        let manager = BackupManager::new(dir.path());

        let id = manager.snapshot().unwrap();
        let backup = manager.backup_dir().join(&id);
        assert!(backup.join("package.json").is_file());
        assert!(backup.join("requirements.txt").is_file());
        assert!(backup.join(METADATA_FILE).is_file());
    }

    #[test]
    fn test_snapshot_id_format() {
        let dir = project_with_manifests();
        let manager = BackupManager::new(dir.path());
        let id = manager.snapshot().unwrap();
        assert!(id.starts_with("backup_"));
        assert_eq!(id.len(), "backup_YYYYmmdd_HHMMSS".len());
    }

    #[test]
    fn test_snapshots_in_same_second_get_distinct_ids() {
        let dir = project_with_manifests();
        let manager = BackupManager::new(dir.path());

        let first = manager.snapshot().unwrap();
        let second = manager.snapshot().unwrap();
        assert_ne!(first, second);

        let backups = manager.list_backups();
        assert_eq!(backups.len(), 2);
        assert!(backups.iter().any(|b| b.id == first));
        assert!(backups.iter().any(|b| b.id == second));
    }

    #[test]
    fn test_restore_roundtrip() {
        let dir = project_with_manifests();
        let manager = BackupManager::new(dir.path());
        let original = std::fs::read_to_string(dir.path().join("package.json")).unwrap();

        let id = manager.snapshot().unwrap();
        std::fs::write(dir.path().join("package.json"), "{\"mangled\": true}").unwrap();

        let restored = manager.restore(&id).unwrap();
        assert_eq!(restored, 2);
        let content = std::fs::read_to_string(dir.path().join("package.json")).unwrap();
        assert_eq!(content, original);
    }

    #[test]
    fn test_restore_unknown_id() {
        let dir = project_with_manifests();
        let manager = BackupManager::new(dir.path());
        let err = manager.restore("backup_19700101_000000").unwrap_err();
        assert!(matches!(err, BackupError::NotFound { .. }));
    }

    #[test]
    fn test_restore_refuses_metadata_less_directory() {
        let dir = project_with_manifests();
        let manager = BackupManager::new(dir.path());
        let fake = manager.backup_dir().join("backup_20240101_120000");
        std::fs::create_dir_all(&fake).unwrap();

        let err = manager.restore("backup_20240101_120000").unwrap_err();
        assert!(matches!(err, BackupError::MetadataMissing { .. }));
    }

    #[test]
    fn test_restore_refuses_incomplete_snapshot() {
        let dir = project_with_manifests();
        let manager = BackupManager::new(dir.path());
        let id = manager.snapshot().unwrap();

        // Remove a file the metadata lists
        std::fs::remove_file(manager.backup_dir().join(&id).join("package.json")).unwrap();
        let mangled = std::fs::read_to_string(dir.path().join("requirements.txt")).unwrap();

        let err = manager.restore(&id).unwrap_err();
        assert!(matches!(err, BackupError::Incomplete { .. }));
        // Nothing was restored
        assert_eq!(
            std::fs::read_to_string(dir.path().join("requirements.txt")).unwrap(),
            mangled
        );
    }

    #[test]
    fn test_list_backups_skips_incomplete_dirs() {
        let dir = project_with_manifests();
        let manager = BackupManager::new(dir.path());
        let id = manager.snapshot().unwrap();
        std::fs::create_dir_all(manager.backup_dir().join("backup_partial")).unwrap();

        let backups = manager.list_backups();
        assert_eq!(backups.len(), 1);
        assert_eq!(backups[0].id, id);
        assert_eq!(backups[0].metadata.files.len(), 2);
    }

    #[test]
    fn test_list_backups_empty() {
        let dir = tempfile::tempdir().unwrap();
        let manager = BackupManager::new(dir.path());
        assert!(manager.list_backups().is_empty());
    }
}
