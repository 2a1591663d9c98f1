//! Project-local npm package detection

use super::{npm_listed_version, Probe};
use crate::command::{CommandRunner, PROBE_TIMEOUT};
use crate::domain::{DependencyDescriptor, DependencyKind, DependencyState, InstallMethod};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// Detects packages in the project's node_modules with `npm list`
pub struct LocalPackageProbe {
    runner: Arc<dyn CommandRunner>,
    root: PathBuf,
}

impl LocalPackageProbe {
    pub fn new(runner: Arc<dyn CommandRunner>, root: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            root: root.into(),
        }
    }
}

#[async_trait]
impl Probe for LocalPackageProbe {
    fn kind(&self) -> DependencyKind {
        DependencyKind::PackageManagerLocal
    }

    async fn probe(&self, descriptor: &DependencyDescriptor) -> DependencyState {
        let package = descriptor.package();
        let output = self
            .runner
            .run(
                "npm",
                &["list", package, "--depth=0", "--json"],
                &self.root,
                PROBE_TIMEOUT,
            )
            .await;
        match output {
            Ok(output) => match npm_listed_version(&output.stdout, package) {
                Some(version) => {
                    DependencyState::detected(Some(version), InstallMethod::NpmLocal)
                        .with_path(self.root.join("node_modules").join(package))
                }
                None => DependencyState::missing_with_note(format!(
                    "not installed in this project: {}",
                    package
                )),
            },
            Err(e) => {
                debug!(package, error = %e, "npm list could not run");
                DependencyState::missing_with_note("npm is not available")
            }
        }
    }
}
