//! Update policy configuration
//!
//! Loaded from `.depsentry/config.json` under the project root. A missing
//! file yields the defaults; a malformed file is logged and also yields
//! the defaults so a stray edit never blocks the tool.

use crate::error::ConfigError;
use crate::persist;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

fn default_true() -> bool {
    true
}

fn default_max_concurrent() -> usize {
    3
}

fn default_timeout_secs() -> u64 {
    300
}

/// Policy knobs controlling which updates are applied and how
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateConfig {
    /// Apply patch-level updates automatically
    pub auto_update_patch: bool,
    /// Apply minor-level updates automatically
    pub auto_update_minor: bool,
    /// Apply major-level updates automatically
    pub auto_update_major: bool,
    /// Run the project test suite after each update
    pub run_tests_after_update: bool,
    /// Snapshot manifests before a non-dry-run batch
    pub create_backup: bool,
    /// Skip development-only dependencies
    pub skip_dev_dependencies: bool,
    /// Package names never to update
    pub exclude_packages: Vec<String>,
    /// Maximum number of packages updated at once
    pub max_concurrent_updates: usize,
    /// Time budget for a single install or test command
    pub update_timeout_secs: u64,
    /// Plan and report without touching anything
    pub dry_run: bool,
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            auto_update_patch: default_true(),
            auto_update_minor: default_true(),
            auto_update_major: false,
            run_tests_after_update: default_true(),
            create_backup: default_true(),
            skip_dev_dependencies: false,
            exclude_packages: Vec::new(),
            max_concurrent_updates: default_max_concurrent(),
            update_timeout_secs: default_timeout_secs(),
            dry_run: false,
        }
    }
}

impl UpdateConfig {
    /// Returns the configuration file path under a project root
    pub fn path(root: &Path) -> PathBuf {
        root.join(".depsentry").join("config.json")
    }

    /// Loads the configuration for a project root
    ///
    /// Missing file or unparseable content both fall back to defaults;
    /// a parse failure is logged.
    pub fn load(root: &Path) -> Self {
        let path = Self::path(root);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(_) => return Self::default(),
        };
        match serde_json::from_str(&content) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "invalid config, using defaults");
                Self::default()
            }
        }
    }

    /// Persists the configuration atomically
    pub fn save(&self, root: &Path) -> Result<(), ConfigError> {
        let path = Self::path(root);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        persist::write_json_atomic(&path, self).map_err(|e| ConfigError::Io { path, source: e })
    }

    /// Returns true when updates of the given shape are allowed by policy
    pub fn allows(&self, major: bool, minor: bool) -> bool {
        if major {
            self.auto_update_major
        } else if minor {
            self.auto_update_minor
        } else {
            self.auto_update_patch
        }
    }
}
