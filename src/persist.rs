//! Atomic JSON persistence and the last-update record
//!
//! JSON files are written to a sibling temp file and renamed into place
//! so readers never observe a half-written document.

use crate::domain::UpdateResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};

/// Writes a value as pretty JSON via temp-file-and-rename
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> io::Result<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, json)?;
    std::fs::rename(&tmp, path)
}

/// Persisted record of the most recent batch-update run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LastUpdateRecord {
    /// When the batch finished
    pub timestamp: DateTime<Utc>,
    /// Number of successful package updates
    pub success_count: usize,
    /// Number of attempted package updates
    pub total_count: usize,
    /// Number of packages whose test gate passed
    pub test_pass_count: usize,
    /// Per-package results
    pub results: Vec<UpdateResult>,
}

impl LastUpdateRecord {
    /// Returns the record path under a project root
    pub fn path(root: &Path) -> PathBuf {
        root.join(".depsentry").join("last_update.json")
    }

    /// Persists the record atomically
    pub fn save(&self, root: &Path) -> io::Result<()> {
        let path = Self::path(root);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        write_json_atomic(&path, self)
    }

    /// Loads the record, when one exists
    pub fn load(root: &Path) -> Option<Self> {
        let content = std::fs::read_to_string(Self::path(root)).ok()?;
        serde_json::from_str(&content).ok()
    }
}
