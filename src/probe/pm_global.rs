//! Global npm package detection

use super::{npm_listed_version, Probe};
use crate::command::{CommandRunner, PROBE_TIMEOUT};
use crate::domain::{DependencyDescriptor, DependencyKind, DependencyState, InstallMethod};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// Detects npm globally-installed packages with `npm list -g`
pub struct GlobalPackageProbe {
    runner: Arc<dyn CommandRunner>,
    root: PathBuf,
}

impl GlobalPackageProbe {
    pub fn new(runner: Arc<dyn CommandRunner>, root: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            root: root.into(),
        }
    }

    async fn global_root(&self) -> Option<PathBuf> {
        let output = self
            .runner
            .run("npm", &["root", "-g"], &self.root, PROBE_TIMEOUT)
            .await
            .ok()?;
        if !output.success() {
            return None;
        }
        let line = output.stdout.lines().next()?.trim();
        (!line.is_empty()).then(|| PathBuf::from(line))
    }
}

#[async_trait]
impl Probe for GlobalPackageProbe {
    fn kind(&self) -> DependencyKind {
        DependencyKind::PackageManagerGlobal
    }

    async fn probe(&self, descriptor: &DependencyDescriptor) -> DependencyState {
        let package = descriptor.package();
        let output = self
            .runner
            .run(
                "npm",
                &["list", "-g", package, "--depth=0", "--json"],
                &self.root,
                PROBE_TIMEOUT,
            )
            .await;
        match output {
            // npm list exits nonzero for missing packages but still emits
            // JSON, so parse regardless of the exit code
            Ok(output) => match npm_listed_version(&output.stdout, package) {
                Some(version) => {
                    let mut state =
                        DependencyState::detected(Some(version), InstallMethod::NpmGlobal);
                    if let Some(root) = self.global_root().await {
                        state = state.with_path(root.join(package));
                    }
                    state
                }
                None => DependencyState::missing_with_note(format!(
                    "not in the npm global tree: {}",
                    package
                )),
            },
            Err(e) => {
                debug!(package, error = %e, "npm list -g could not run");
                DependencyState::missing_with_note("npm is not available")
            }
        }
    }
}
