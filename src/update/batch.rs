//! Batch update orchestration
//!
//! Applies the policy filter, snapshots manifests, then updates the
//! selected candidates bounded-parallel. One package failing never stops
//! the others; the summary partitions successes and failures. The test
//! gate runs after each install and records a warning on failure rather
//! than rolling back.

use super::{CandidateFilter, SkipReason};
use crate::backup::BackupManager;
use crate::command::CommandRunner;
use crate::domain::{
    BatchSummary, DependencyDescriptor, DependencyKind, Ecosystem, UpdateCandidate, UpdateConfig,
    UpdateResult,
};
use crate::error::EngineError;
use crate::installer::Installer;
use crate::persist::LastUpdateRecord;
use chrono::Utc;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

/// Runs batch updates for one project root
pub struct BatchUpdater {
    runner: Arc<dyn CommandRunner>,
    installer: Arc<Installer>,
    config: UpdateConfig,
    root: PathBuf,
}

impl BatchUpdater {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        root: impl Into<PathBuf>,
        config: UpdateConfig,
    ) -> Self {
        let root = root.into();
        let installer = Arc::new(Installer::new(
            runner.clone(),
            &root,
            Duration::from_secs(config.update_timeout_secs),
        ));
        Self {
            runner,
            installer,
            config,
            root,
        }
    }

    /// Updates the candidates the policy selects
    ///
    /// Returns the skip list alongside the summary so callers can report
    /// why packages were left alone.
    pub async fn run(
        &self,
        candidates: Vec<UpdateCandidate>,
    ) -> Result<(BatchSummary, Vec<(UpdateCandidate, SkipReason)>), EngineError> {
        let filter = CandidateFilter::new(&self.config);
        let (selected, skipped) = filter.plan(candidates);
        if selected.is_empty() {
            return Ok((BatchSummary::new(Vec::new(), self.config.dry_run), skipped));
        }

        if self.config.dry_run {
            let results = selected.iter().map(dry_run_result).collect();
            return Ok((BatchSummary::new(results, true), skipped));
        }

        let backup_id = if self.config.create_backup {
            // A failed snapshot aborts the batch before anything changes
            Some(BackupManager::new(&self.root).snapshot()?)
        } else {
            None
        };

        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_updates.max(1)));
        let mut set = JoinSet::new();
        for candidate in selected {
            let semaphore = semaphore.clone();
            let installer = self.installer.clone();
            let runner = self.runner.clone();
            let config = self.config.clone();
            let backup_id = backup_id.clone();
            set.spawn(async move {
                let _permit = semaphore.acquire().await.expect("semaphore open");
                update_single(&candidate, installer, runner, &config, backup_id).await
            });
        }

        let mut results = Vec::new();
        while let Some(joined) = set.join_next().await {
            if let Ok(result) = joined {
                results.push(result);
            }
        }
        results.sort_by(|a, b| a.dependency.cmp(&b.dependency));

        let summary = BatchSummary::new(results, false);
        info!(
            succeeded = summary.success_count(),
            failed = summary.failure_count(),
            "batch update finished"
        );

        let record = LastUpdateRecord {
            timestamp: Utc::now(),
            success_count: summary.success_count(),
            total_count: summary.total(),
            test_pass_count: summary.test_pass_count(),
            results: summary.results.clone(),
        };
        if let Err(e) = record.save(&self.root) {
            warn!(error = %e, "could not persist update record");
        }

        Ok((summary, skipped))
    }
}

fn dry_run_result(candidate: &UpdateCandidate) -> UpdateResult {
    let mut result = UpdateResult::started(
        &candidate.name,
        candidate.ecosystem,
        &candidate.current_version,
    );
    result.succeed(&candidate.latest_version);
    result.warn("dry run: nothing was changed");
    result
}

fn descriptor_for(candidate: &UpdateCandidate) -> DependencyDescriptor {
    let kind = match candidate.ecosystem {
        Ecosystem::Python => DependencyKind::LanguagePackage,
        Ecosystem::Node => DependencyKind::PackageManagerLocal,
    };
    DependencyDescriptor::new(&candidate.name, kind, candidate.ecosystem)
}

async fn update_single(
    candidate: &UpdateCandidate,
    installer: Arc<Installer>,
    runner: Arc<dyn CommandRunner>,
    config: &UpdateConfig,
    backup_id: Option<String>,
) -> UpdateResult {
    let started = Instant::now();
    let mut result = UpdateResult::started(
        &candidate.name,
        candidate.ecosystem,
        &candidate.current_version,
    );
    result.backup_id = backup_id;

    if candidate.major_update {
        result.warn(format!(
            "major version jump: {} -> {}",
            candidate.current_version, candidate.latest_version
        ));
    }
    if candidate.confidence == crate::domain::Confidence::Low {
        result.warn("low confidence update, review recommended");
    }

    let descriptor = descriptor_for(candidate);
    let outcome = installer.install(&descriptor, &candidate.latest_version).await;
    result.logs.extend(outcome.logs.iter().cloned());
    if outcome.success {
        result.succeed(
            outcome
                .version
                .unwrap_or_else(|| candidate.latest_version.clone()),
        );
        if config.run_tests_after_update {
            match run_test_gate(runner.as_ref(), installer.root(), candidate.ecosystem, config)
                .await
            {
                Some(true) => result.test_passed = Some(true),
                Some(false) => {
                    result.test_passed = Some(false);
                    result.warn("test suite failed after update");
                }
                None => {}
            }
        }
    } else {
        result.fail(outcome.error.unwrap_or_else(|| "install failed".to_string()));
    }

    result.elapsed_secs = started.elapsed().as_secs_f64();
    result
}

/// Runs the ecosystem's test command, returning None when there is none
/// to run
async fn run_test_gate(
    runner: &dyn CommandRunner,
    root: &std::path::Path,
    ecosystem: Ecosystem,
    config: &UpdateConfig,
) -> Option<bool> {
    let (program, args): (&str, Vec<&str>) = match ecosystem {
        Ecosystem::Python => ("pytest", vec!["--tb=short", "-q"]),
        Ecosystem::Node => ("npm", vec!["test"]),
    };
    let timeout = Duration::from_secs(config.update_timeout_secs);
    match runner.run(program, &args, root, timeout).await {
        Ok(output) => Some(output.success()),
        // No test runner available is not a failure
        Err(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::tests::MockRunner;

    fn candidate(name: &str, current: &str, latest: &str) -> UpdateCandidate {
        UpdateCandidate::classified(name, Ecosystem::Python, current, latest)
    }

    fn quiet_config() -> UpdateConfig {
        UpdateConfig {
            create_backup: false,
            run_tests_after_update: false,
            ..UpdateConfig::default()
        }
    }

    #[tokio::test]
    async fn test_empty_candidates_give_empty_summary() {
        let dir = tempfile::tempdir().unwrap();
        let updater = BatchUpdater::new(Arc::new(MockRunner::new()), dir.path(), quiet_config());

        let (summary, skipped) = updater.run(Vec::new()).await.unwrap();
        assert!(summary.is_empty());
        assert!(skipped.is_empty());
    }

    #[tokio::test]
    async fn test_dry_run_touches_nothing() {
        let dir = tempfile::tempdir().unwrap();
        // No responses registered: any command would fail the test
        let config = UpdateConfig {
            dry_run: true,
            ..UpdateConfig::default()
        };
        let updater = BatchUpdater::new(Arc::new(MockRunner::new()), dir.path(), config);

        let (summary, _) = updater
            .run(vec![candidate("requests", "2.25.1", "2.25.2")])
            .await
            .unwrap();
        assert!(summary.dry_run);
        assert_eq!(summary.success_count(), 1);
        assert!(summary.results[0].warnings[0].contains("dry run"));
        // No backup directory was created either
        assert!(!dir.path().join(".depsentry").exists());
    }

    #[tokio::test]
    async fn test_successful_update_persists_record() {
        let dir = tempfile::tempdir().unwrap();
        let runner = MockRunner::new()
            .respond("pip --version", 0, "pip 24.0\n", "")
            .respond("pip install requests==2.25.2", 0, "", "")
            .respond("pip show requests", 0, "Name: requests\nVersion: 2.25.2\n", "");
        let updater = BatchUpdater::new(Arc::new(runner), dir.path(), quiet_config());

        let (summary, _) = updater
            .run(vec![candidate("requests", "2.25.1", "2.25.2")])
            .await
            .unwrap();
        assert_eq!(summary.success_count(), 1);
        assert_eq!(summary.results[0].new_version, "2.25.2");

        let record = LastUpdateRecord::load(dir.path()).unwrap();
        assert_eq!(record.success_count, 1);
        assert_eq!(record.total_count, 1);
    }

    #[tokio::test]
    async fn test_installer_output_kept_out_of_warnings() {
        let dir = tempfile::tempdir().unwrap();
        let runner = MockRunner::new()
            .respond("pip --version", 0, "pip 24.0\n", "")
            .respond(
                "pip install requests==2.25.2",
                0,
                "",
                "WARNING: pip is being invoked by an old script wrapper\n",
            )
            .respond("pip show requests", 0, "Name: requests\nVersion: 2.25.2\n", "");
        let updater = BatchUpdater::new(Arc::new(runner), dir.path(), quiet_config());

        let (summary, _) = updater
            .run(vec![candidate("requests", "2.25.1", "2.25.2")])
            .await
            .unwrap();
        let result = &summary.results[0];
        assert!(result.success);
        assert!(result.warnings.is_empty());
        assert!(result.logs.iter().any(|l| l.contains("old script wrapper")));
    }

    #[tokio::test]
    async fn test_failure_is_isolated() {
        let dir = tempfile::tempdir().unwrap();
        let runner = MockRunner::new()
            .respond("pip --version", 0, "pip 24.0\n", "")
            .respond("pip install good==1.0.1", 0, "", "")
            .respond("pip show good", 0, "Name: good\nVersion: 1.0.1\n", "")
            .respond("pip install bad==2.0.1", 1, "", "boom\n");
        let mut config = quiet_config();
        config.max_concurrent_updates = 2;
        let updater = BatchUpdater::new(Arc::new(runner), dir.path(), config);

        let (summary, _) = updater
            .run(vec![
                candidate("good", "1.0.0", "1.0.1"),
                candidate("bad", "2.0.0", "2.0.1"),
            ])
            .await
            .unwrap();
        assert_eq!(summary.total(), 2);
        assert_eq!(summary.success_count(), 1);
        assert_eq!(summary.failure_count(), 1);

        let bad = summary.results.iter().find(|r| r.dependency == "bad").unwrap();
        assert!(bad.errors[0].contains("boom"));
    }

    #[tokio::test]
    async fn test_backup_taken_before_updates() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("requirements.txt"), "requests==2.25.1\n").unwrap();
        let runner = MockRunner::new()
            .respond("pip --version", 0, "pip 24.0\n", "")
            .respond("pip install requests==2.25.2", 0, "", "")
            .respond("pip show requests", 0, "Name: requests\nVersion: 2.25.2\n", "");
        let mut config = quiet_config();
        config.create_backup = true;
        let updater = BatchUpdater::new(Arc::new(runner), dir.path(), config);

        let (summary, _) = updater
            .run(vec![candidate("requests", "2.25.1", "2.25.2")])
            .await
            .unwrap();
        let backup_id = summary.results[0].backup_id.clone().unwrap();
        let manager = BackupManager::new(dir.path());
        assert!(manager.list_backups().iter().any(|b| b.id == backup_id));
    }

    #[tokio::test]
    async fn test_failing_test_gate_is_warning_only() {
        let dir = tempfile::tempdir().unwrap();
        let runner = MockRunner::new()
            .respond("pip --version", 0, "pip 24.0\n", "")
            .respond("pip install requests==2.25.2", 0, "", "")
            .respond("pip show requests", 0, "Name: requests\nVersion: 2.25.2\n", "")
            .respond("pytest --tb=short -q", 1, "1 failed\n", "");
        let mut config = quiet_config();
        config.run_tests_after_update = true;
        let updater = BatchUpdater::new(Arc::new(runner), dir.path(), config);

        let (summary, _) = updater
            .run(vec![candidate("requests", "2.25.1", "2.25.2")])
            .await
            .unwrap();
        let result = &summary.results[0];
        // Still a success: the gate warns, it does not roll back
        assert!(result.success);
        assert_eq!(result.test_passed, Some(false));
        assert!(result.warnings.iter().any(|w| w.contains("test suite failed")));
    }

    #[tokio::test]
    async fn test_missing_test_runner_leaves_gate_unset() {
        let dir = tempfile::tempdir().unwrap();
        let runner = MockRunner::new()
            .respond("pip --version", 0, "pip 24.0\n", "")
            .respond("pip install requests==2.25.2", 0, "", "")
            .respond("pip show requests", 0, "Name: requests\nVersion: 2.25.2\n", "");
        let mut config = quiet_config();
        config.run_tests_after_update = true;
        let updater = BatchUpdater::new(Arc::new(runner), dir.path(), config);

        let (summary, _) = updater
            .run(vec![candidate("requests", "2.25.1", "2.25.2")])
            .await
            .unwrap();
        assert!(summary.results[0].success);
        assert!(summary.results[0].test_passed.is_none());
    }

    #[tokio::test]
    async fn test_skipped_candidates_reported() {
        let dir = tempfile::tempdir().unwrap();
        let updater = BatchUpdater::new(Arc::new(MockRunner::new()), dir.path(), quiet_config());

        let (summary, skipped) = updater
            .run(vec![candidate("big", "1.0.0", "2.0.0")])
            .await
            .unwrap();
        assert!(summary.is_empty());
        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0].1, SkipReason::MajorNotAllowed);
    }

    #[tokio::test]
    async fn test_major_update_warns_when_allowed() {
        let dir = tempfile::tempdir().unwrap();
        let runner = MockRunner::new()
            .respond("pip --version", 0, "pip 24.0\n", "")
            .respond("pip install click==8.1.7", 0, "", "")
            .respond("pip show click", 0, "Name: click\nVersion: 8.1.7\n", "");
        let mut config = quiet_config();
        config.auto_update_major = true;
        let updater = BatchUpdater::new(Arc::new(runner), dir.path(), config);

        let (summary, _) = updater
            .run(vec![candidate("click", "7.1.2", "8.1.7")])
            .await
            .unwrap();
        let result = &summary.results[0];
        assert!(result.success);
        assert!(result.warnings.iter().any(|w| w.contains("major version jump")));
    }
}
