//! Per-package update results and the batch summary

use super::Ecosystem;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of updating a single package
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateResult {
    /// Package name
    pub dependency: String,
    /// Which package universe the package lives in
    pub ecosystem: Ecosystem,
    /// Version before the update
    pub old_version: String,
    /// Version after the update (unchanged on failure)
    pub new_version: String,
    /// Whether the installation succeeded
    pub success: bool,
    /// Non-fatal observations (major jump, test gate failure, ...)
    #[serde(default)]
    pub warnings: Vec<String>,
    /// Fatal errors for this package
    #[serde(default)]
    pub errors: Vec<String>,
    /// Raw command output captured during the install
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub logs: Vec<String>,
    /// Whether the post-update test gate passed (None when not run)
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub test_passed: Option<bool>,
    /// Backup snapshot id associated with this batch, when one was taken
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub backup_id: Option<String>,
    /// Wall time spent updating this package
    pub elapsed_secs: f64,
}

impl UpdateResult {
    /// Creates a pending result for a package about to be updated
    pub fn started(
        dependency: impl Into<String>,
        ecosystem: Ecosystem,
        old_version: impl Into<String>,
    ) -> Self {
        let old_version = old_version.into();
        Self {
            dependency: dependency.into(),
            ecosystem,
            new_version: old_version.clone(),
            old_version,
            success: false,
            warnings: Vec::new(),
            errors: Vec::new(),
            logs: Vec::new(),
            test_passed: None,
            backup_id: None,
            elapsed_secs: 0.0,
        }
    }

    /// Records a successful install to the given version
    pub fn succeed(&mut self, new_version: impl Into<String>) {
        self.success = true;
        self.new_version = new_version.into();
    }

    /// Records a fatal error
    pub fn fail(&mut self, error: impl Into<String>) {
        self.success = false;
        self.errors.push(error.into());
    }

    /// Records a non-fatal warning
    pub fn warn(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }
}

impl fmt::Display for UpdateResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.success {
            write!(
                f,
                "{}: {} -> {}",
                self.dependency, self.old_version, self.new_version
            )
        } else {
            write!(f, "{}: failed", self.dependency)
        }
    }
}

/// Aggregated outcome of one batch-update run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Per-package results
    pub results: Vec<UpdateResult>,
    /// Whether the batch ran in dry-run mode
    pub dry_run: bool,
}

impl BatchSummary {
    /// Creates a summary over the given results
    pub fn new(results: Vec<UpdateResult>, dry_run: bool) -> Self {
        Self { results, dry_run }
    }

    /// Number of packages updated successfully
    pub fn success_count(&self) -> usize {
        self.results.iter().filter(|r| r.success).count()
    }

    /// Number of packages that failed to update
    pub fn failure_count(&self) -> usize {
        self.results.iter().filter(|r| !r.success).count()
    }

    /// Number of packages whose post-update test gate passed
    pub fn test_pass_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.test_passed == Some(true))
            .count()
    }

    /// Total number of attempted packages
    pub fn total(&self) -> usize {
        self.results.len()
    }

    /// Returns true when no packages were attempted
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Returns true when every attempted package succeeded
    pub fn all_succeeded(&self) -> bool {
        self.results.iter().all(|r| r.success)
    }
}
