//! Outdated-package detection
//!
//! For every manifest-declared dependency, resolves the installed
//! version and the latest upstream version, then classifies the pair
//! into an [`UpdateCandidate`]. Packages whose versions cannot be
//! resolved are skipped with a log line.

use super::SecurityAuditor;
use crate::command::{CommandRunner, PROBE_TIMEOUT};
use crate::domain::{Ecosystem, UpdateCandidate};
use crate::manifest::{self, ManifestDependency};
use crate::probe::npm_listed_version;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info};

/// How many version lookups run at once
const LOOKUP_CONCURRENCY: usize = 8;

const REGISTRY_TIMEOUT: Duration = Duration::from_secs(10);

/// Finds update candidates among a project's declared dependencies
pub struct UpdateChecker {
    runner: Arc<dyn CommandRunner>,
    root: PathBuf,
    http: reqwest::Client,
}

impl UpdateChecker {
    pub fn new(runner: Arc<dyn CommandRunner>, root: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            root: root.into(),
            http: reqwest::Client::new(),
        }
    }

    /// Collects update candidates for every resolvable declared dependency
    pub async fn collect_candidates(&self) -> Vec<UpdateCandidate> {
        let deps = manifest::discover_dependencies(&self.root);
        if deps.is_empty() {
            return Vec::new();
        }

        let ecosystems: Vec<Ecosystem> = manifest::present_ecosystems(&self.root);
        let auditor = SecurityAuditor::new(self.runner.clone(), &self.root);
        let mut flagged = std::collections::HashSet::new();
        for ecosystem in &ecosystems {
            flagged.extend(auditor.flagged_packages(*ecosystem).await);
        }

        let semaphore = Arc::new(Semaphore::new(LOOKUP_CONCURRENCY));
        let mut set = JoinSet::new();
        for dep in deps {
            let runner = self.runner.clone();
            let root = self.root.clone();
            let http = self.http.clone();
            let semaphore = semaphore.clone();
            set.spawn(async move {
                let _permit = semaphore.acquire().await.expect("semaphore open");
                resolve_candidate(&dep, runner, &root, &http).await
            });
        }

        let mut candidates = Vec::new();
        while let Some(joined) = set.join_next().await {
            if let Ok(Some(mut candidate)) = joined {
                if flagged.contains(&candidate.name) {
                    candidate.security_update = true;
                }
                candidates.push(candidate);
            }
        }
        candidates.sort_by(|a, b| a.name.cmp(&b.name));
        info!(count = candidates.len(), "resolved update candidates");
        candidates
    }
}

async fn resolve_candidate(
    dep: &ManifestDependency,
    runner: Arc<dyn CommandRunner>,
    root: &std::path::Path,
    http: &reqwest::Client,
) -> Option<UpdateCandidate> {
    // Skip the registry lookup entirely when the package is not installed
    let current = match dep.ecosystem {
        Ecosystem::Python => python_current_version(&dep.name, runner.as_ref(), root).await,
        Ecosystem::Node => node_current_version(&dep.name, runner.as_ref(), root).await,
    };
    let Some(current) = current else {
        debug!(name = %dep.name, "not installed, skipping");
        return None;
    };
    let latest = match dep.ecosystem {
        Ecosystem::Python => python_latest_version(&dep.name, runner.as_ref(), root, http).await,
        Ecosystem::Node => node_latest_version(&dep.name, runner.as_ref(), root).await,
    };
    let Some(latest) = latest else {
        debug!(name = %dep.name, "no upstream version found, skipping");
        return None;
    };

    let mut candidate = UpdateCandidate::classified(&dep.name, dep.ecosystem, current, latest);
    candidate.is_dev = dep.is_dev;
    Some(candidate)
}

async fn python_current_version(
    name: &str,
    runner: &dyn CommandRunner,
    root: &std::path::Path,
) -> Option<String> {
    let output = runner
        .run("pip", &["show", name], root, PROBE_TIMEOUT)
        .await
        .ok()?;
    if !output.success() {
        return None;
    }
    output.stdout.lines().find_map(|line| {
        let (key, value) = line.split_once(':')?;
        key.trim()
            .eq_ignore_ascii_case("version")
            .then(|| value.trim().to_string())
    })
}

/// Resolves the latest PyPI version via `pip index versions`, falling
/// back to the PyPI JSON API when the subcommand is unavailable
async fn python_latest_version(
    name: &str,
    runner: &dyn CommandRunner,
    root: &std::path::Path,
    http: &reqwest::Client,
) -> Option<String> {
    if let Ok(output) = runner
        .run("pip", &["index", "versions", name], root, REGISTRY_TIMEOUT)
        .await
    {
        if output.success() {
            // "Available versions: 2.31.0, 2.30.0, ..."
            if let Some(latest) = output.stdout.lines().find_map(|line| {
                let rest = line.trim().strip_prefix("Available versions:")?;
                rest.split(',').next().map(|v| v.trim().to_string())
            }) {
                if !latest.is_empty() {
                    return Some(latest);
                }
            }
        }
    }

    let url = format!("https://pypi.org/pypi/{}/json", name);
    let response = http
        .get(&url)
        .timeout(REGISTRY_TIMEOUT)
        .send()
        .await
        .ok()?
        .error_for_status()
        .ok()?;
    let value: serde_json::Value = response.json().await.ok()?;
    value
        .get("info")?
        .get("version")?
        .as_str()
        .map(|v| v.to_string())
}

async fn node_current_version(
    name: &str,
    runner: &dyn CommandRunner,
    root: &std::path::Path,
) -> Option<String> {
    let output = runner
        .run("npm", &["list", name, "--depth=0", "--json"], root, PROBE_TIMEOUT)
        .await
        .ok()?;
    npm_listed_version(&output.stdout, name)
}

async fn node_latest_version(
    name: &str,
    runner: &dyn CommandRunner,
    root: &std::path::Path,
) -> Option<String> {
    let output = runner
        .run("npm", &["view", name, "version"], root, REGISTRY_TIMEOUT)
        .await
        .ok()?;
    if !output.success() {
        return None;
    }
    let version = output.stdout.trim();
    (!version.is_empty()).then(|| version.to_string())
}
