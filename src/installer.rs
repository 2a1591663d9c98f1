//! Installation strategies per dependency kind
//!
//! Picks the right package-manager command for a dependency, runs it,
//! and verifies the result with a re-probe. Binaries have no automated
//! strategy and come back with manual guidance instead.

use crate::command::{command_available, render_command, CommandError, CommandRunner};
use crate::domain::{
    DependencyDescriptor, DependencyKind, DependencyState, Ecosystem, InstallMethod,
};
use crate::error::InstallError;
use crate::probe::probe_for_kind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Which package managers answer on this system for this project
#[derive(Debug, Clone, Copy, Default)]
pub struct PackageManagers {
    pub pip: bool,
    pub poetry: bool,
    pub pipenv: bool,
    pub npm: bool,
    pub yarn: bool,
    pub pnpm: bool,
}

/// How long a package-manager detection result stays fresh
const PM_CACHE_TTL: Duration = Duration::from_secs(300);

/// Outcome of one installation attempt
#[derive(Debug, Clone)]
pub struct InstallationOutcome {
    /// Whether the install succeeded and the re-probe confirmed it
    pub success: bool,
    /// The install method used, when one was attempted
    pub method: Option<InstallMethod>,
    /// Version observed by the verification re-probe
    pub version: Option<String>,
    /// Error description on failure
    pub error: Option<String>,
    /// Command output worth surfacing to the caller
    pub logs: Vec<String>,
}

impl InstallationOutcome {
    fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            method: None,
            version: None,
            error: Some(error.into()),
            logs: Vec::new(),
        }
    }
}

/// Installs and updates dependencies through detected package managers
pub struct Installer {
    runner: Arc<dyn CommandRunner>,
    root: PathBuf,
    timeout: Duration,
    pm_cache: Mutex<Option<(PackageManagers, Instant)>>,
}

impl Installer {
    pub fn new(runner: Arc<dyn CommandRunner>, root: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            runner,
            root: root.into(),
            timeout,
            pm_cache: Mutex::new(None),
        }
    }

    /// Detects available package managers, caching the answer briefly
    ///
    /// Project-scoped managers (poetry, pipenv, yarn, pnpm) only count
    /// when their manifest or lock file is present AND the command
    /// answers.
    pub async fn package_managers(&self) -> PackageManagers {
        {
            let cache = self.pm_cache.lock().await;
            if let Some((managers, at)) = *cache {
                if at.elapsed() < PM_CACHE_TTL {
                    return managers;
                }
            }
        }

        let root = &self.root;
        let managers = PackageManagers {
            pip: command_available(self.runner.as_ref(), "pip", root).await,
            poetry: root.join("poetry.lock").is_file()
                && command_available(self.runner.as_ref(), "poetry", root).await,
            pipenv: root.join("Pipfile").is_file()
                && command_available(self.runner.as_ref(), "pipenv", root).await,
            npm: command_available(self.runner.as_ref(), "npm", root).await,
            yarn: root.join("yarn.lock").is_file()
                && command_available(self.runner.as_ref(), "yarn", root).await,
            pnpm: root.join("pnpm-lock.yaml").is_file()
                && command_available(self.runner.as_ref(), "pnpm", root).await,
        };
        debug!(?managers, "detected package managers");

        let mut cache = self.pm_cache.lock().await;
        *cache = Some((managers, Instant::now()));
        managers
    }

    /// Installs a dependency at the given version and verifies the result
    pub async fn install(
        &self,
        descriptor: &DependencyDescriptor,
        target_version: &str,
    ) -> InstallationOutcome {
        let (program, args, method) = match self.strategy(descriptor, target_version).await {
            Ok(plan) => plan,
            Err(outcome) => return *outcome,
        };
        let args_refs: Vec<&str> = args.iter().map(|a| a.as_str()).collect();
        let rendered = render_command(&program, &args_refs);
        info!(package = descriptor.package(), command = %rendered, "installing");

        let output = self
            .runner
            .run(&program, &args_refs, &self.root, self.timeout)
            .await;
        let mut logs = Vec::new();
        match output {
            Ok(output) if output.success() => {
                if !output.stderr.trim().is_empty() {
                    logs.push(output.stderr.trim().to_string());
                }
            }
            Ok(output) => {
                let detail = if output.stderr.trim().is_empty() {
                    output.stdout.trim()
                } else {
                    output.stderr.trim()
                };
                let err = InstallError::command_failed(
                    descriptor.package(),
                    &rendered,
                    format!("exited with {}: {}", output.code, detail),
                );
                return InstallationOutcome {
                    success: false,
                    method: Some(method),
                    version: None,
                    error: Some(err.to_string()),
                    logs,
                };
            }
            Err(CommandError::Timeout(e)) => {
                return InstallationOutcome {
                    success: false,
                    method: Some(method),
                    version: None,
                    error: Some(e.to_string()),
                    logs,
                };
            }
            Err(e) => {
                return InstallationOutcome {
                    success: false,
                    method: Some(method),
                    version: None,
                    error: Some(e.to_string()),
                    logs,
                };
            }
        }

        // The install command claimed success; trust only the re-probe
        let probe = probe_for_kind(descriptor.kind, self.runner.clone(), &self.root);
        let state: DependencyState = probe.probe(descriptor).await;
        if state.installed {
            InstallationOutcome {
                success: true,
                method: Some(method),
                version: state.version,
                error: None,
                logs,
            }
        } else {
            warn!(package = descriptor.package(), "install verification failed");
            InstallationOutcome {
                success: false,
                method: Some(method),
                version: None,
                error: Some(InstallError::verification_failed(descriptor.package()).to_string()),
                logs,
            }
        }
    }

    /// Picks the install command for a descriptor
    async fn strategy(
        &self,
        descriptor: &DependencyDescriptor,
        version: &str,
    ) -> Result<(String, Vec<String>, InstallMethod), Box<InstallationOutcome>> {
        let package = descriptor.package();
        let managers = self.package_managers().await;

        let plan = match descriptor.kind {
            DependencyKind::Binary => {
                let err = InstallError::manual(
                    package,
                    "system binary, install it with your system package manager",
                );
                return Err(Box::new(InstallationOutcome::failed(err.to_string())));
            }
            DependencyKind::LanguagePackage => {
                if managers.poetry {
                    (
                        "poetry".to_string(),
                        vec!["add".to_string(), format!("{}@{}", package, version)],
                        InstallMethod::Poetry,
                    )
                } else if managers.pipenv {
                    (
                        "pipenv".to_string(),
                        vec!["install".to_string(), format!("{}=={}", package, version)],
                        InstallMethod::Pipenv,
                    )
                } else if managers.pip {
                    (
                        "pip".to_string(),
                        vec!["install".to_string(), format!("{}=={}", package, version)],
                        InstallMethod::Pip,
                    )
                } else {
                    return Err(Box::new(InstallationOutcome::failed(
                        InstallError::NoStrategy {
                            package: package.to_string(),
                            kind: descriptor.kind,
                        }
                        .to_string(),
                    )));
                }
            }
            DependencyKind::PackageManagerGlobal | DependencyKind::SpecializedTool => {
                if managers.npm {
                    (
                        "npm".to_string(),
                        vec![
                            "install".to_string(),
                            "-g".to_string(),
                            format!("{}@{}", package, version),
                        ],
                        InstallMethod::NpmGlobal,
                    )
                } else {
                    return Err(Box::new(InstallationOutcome::failed(
                        InstallError::NoStrategy {
                            package: package.to_string(),
                            kind: descriptor.kind,
                        }
                        .to_string(),
                    )));
                }
            }
            DependencyKind::PackageManagerLocal => {
                if managers.yarn {
                    (
                        "yarn".to_string(),
                        vec!["add".to_string(), format!("{}@{}", package, version)],
                        InstallMethod::Yarn,
                    )
                } else if managers.pnpm {
                    (
                        "pnpm".to_string(),
                        vec!["add".to_string(), format!("{}@{}", package, version)],
                        InstallMethod::Pnpm,
                    )
                } else if managers.npm {
                    (
                        "npm".to_string(),
                        vec!["install".to_string(), format!("{}@{}", package, version)],
                        InstallMethod::NpmLocal,
                    )
                } else {
                    return Err(Box::new(InstallationOutcome::failed(
                        InstallError::NoStrategy {
                            package: package.to_string(),
                            kind: descriptor.kind,
                        }
                        .to_string(),
                    )));
                }
            }
        };
        Ok(plan)
    }

    /// Returns the project root this installer operates on
    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::tests::MockRunner;

    fn python_descriptor(name: &str) -> DependencyDescriptor {
        DependencyDescriptor::new(name, DependencyKind::LanguagePackage, Ecosystem::Python)
    }

    fn node_descriptor(name: &str) -> DependencyDescriptor {
        DependencyDescriptor::new(name, DependencyKind::PackageManagerLocal, Ecosystem::Node)
    }

    fn installer(runner: MockRunner, root: &Path) -> Installer {
        Installer::new(Arc::new(runner), root, Duration::from_secs(300))
    }

    #[tokio::test]
    async fn test_binary_requires_manual_install() {
        let dir = tempfile::tempdir().unwrap();
        let installer = installer(MockRunner::new(), dir.path());
        let descriptor =
            DependencyDescriptor::new("git", DependencyKind::Binary, Ecosystem::Node);

        let outcome = installer.install(&descriptor, "2.43.0").await;
        assert!(!outcome.success);
        assert!(outcome.error.unwrap().contains("system package manager"));
    }

    #[tokio::test]
    async fn test_pip_install_success_with_verification() {
        let dir = tempfile::tempdir().unwrap();
        let runner = MockRunner::new()
            .respond("pip --version", 0, "pip 24.0\n", "")
            .respond("npm --version", 0, "10.2.4\n", "")
            .respond("pip install requests==2.25.2", 0, "installed\n", "")
            .respond(
                "pip show requests",
                0,
                "Name: requests\nVersion: 2.25.2\n",
                "",
            );
        let installer = installer(runner, dir.path());

        let outcome = installer.install(&python_descriptor("requests"), "2.25.2").await;
        assert!(outcome.success);
        assert_eq!(outcome.method, Some(InstallMethod::Pip));
        assert_eq!(outcome.version.as_deref(), Some("2.25.2"));
    }

    #[tokio::test]
    async fn test_poetry_preferred_when_lock_present() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("poetry.lock"), "").unwrap();
        let runner = MockRunner::new()
            .respond("pip --version", 0, "pip 24.0\n", "")
            .respond("poetry --version", 0, "Poetry (version 1.7.1)\n", "")
            .respond("poetry add requests@2.25.2", 0, "", "")
            .respond(
                "pip show requests",
                0,
                "Name: requests\nVersion: 2.25.2\n",
                "",
            );
        let installer = installer(runner, dir.path());

        let outcome = installer.install(&python_descriptor("requests"), "2.25.2").await;
        assert!(outcome.success);
        assert_eq!(outcome.method, Some(InstallMethod::Poetry));
    }

    #[tokio::test]
    async fn test_install_command_failure() {
        let dir = tempfile::tempdir().unwrap();
        let runner = MockRunner::new()
            .respond("pip --version", 0, "pip 24.0\n", "")
            .respond("pip install requests==9.9.9", 1, "", "No matching distribution\n");
        let installer = installer(runner, dir.path());

        let outcome = installer.install(&python_descriptor("requests"), "9.9.9").await;
        assert!(!outcome.success);
        let error = outcome.error.unwrap();
        assert!(error.contains("exited with 1"));
        assert!(error.contains("No matching distribution"));
    }

    #[tokio::test]
    async fn test_verification_failure_after_claimed_success() {
        let dir = tempfile::tempdir().unwrap();
        let runner = MockRunner::new()
            .respond("pip --version", 0, "pip 24.0\n", "")
            .respond("pip install ghost==1.0.0", 0, "installed\n", "")
            .respond("pip show ghost", 1, "", "not found\n");
        let installer = installer(runner, dir.path());

        let outcome = installer.install(&python_descriptor("ghost"), "1.0.0").await;
        assert!(!outcome.success);
        assert!(outcome.error.unwrap().contains("not detected after installation"));
    }

    #[tokio::test]
    async fn test_npm_local_install() {
        let dir = tempfile::tempdir().unwrap();
        let runner = MockRunner::new()
            .respond("npm --version", 0, "10.2.4\n", "")
            .respond("npm install lodash@4.17.21", 0, "", "")
            .respond(
                "npm list lodash --depth=0 --json",
                0,
                r#"{"dependencies": {"lodash": {"version": "4.17.21"}}}"#,
                "",
            );
        let installer = installer(runner, dir.path());

        let outcome = installer.install(&node_descriptor("lodash"), "4.17.21").await;
        assert!(outcome.success);
        assert_eq!(outcome.method, Some(InstallMethod::NpmLocal));
    }

    #[tokio::test]
    async fn test_yarn_preferred_when_lock_present() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("yarn.lock"), "").unwrap();
        let runner = MockRunner::new()
            .respond("npm --version", 0, "10.2.4\n", "")
            .respond("yarn --version", 0, "1.22.21\n", "")
            .respond("yarn add lodash@4.17.21", 0, "", "")
            .respond(
                "npm list lodash --depth=0 --json",
                0,
                r#"{"dependencies": {"lodash": {"version": "4.17.21"}}}"#,
                "",
            );
        let installer = installer(runner, dir.path());

        let outcome = installer.install(&node_descriptor("lodash"), "4.17.21").await;
        assert!(outcome.success);
        assert_eq!(outcome.method, Some(InstallMethod::Yarn));
    }

    #[tokio::test]
    async fn test_no_package_manager_available() {
        let dir = tempfile::tempdir().unwrap();
        let installer = installer(MockRunner::new(), dir.path());

        let outcome = installer.install(&python_descriptor("requests"), "2.0.0").await;
        assert!(!outcome.success);
        assert!(outcome.error.unwrap().contains("no installation strategy"));
    }

    #[tokio::test]
    async fn test_package_manager_detection_cached() {
        let dir = tempfile::tempdir().unwrap();
        let runner = MockRunner::new().respond("npm --version", 0, "10.2.4\n", "");
        let installer = installer(runner, dir.path());

        let first = installer.package_managers().await;
        let second = installer.package_managers().await;
        assert!(first.npm);
        assert!(second.npm);
        assert!(!first.yarn);
    }
}
