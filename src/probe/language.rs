//! Python language package detection via pip

use super::Probe;
use crate::command::{CommandRunner, PROBE_TIMEOUT};
use crate::domain::{DependencyDescriptor, DependencyKind, DependencyState, InstallMethod};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// Detects pip-installed packages with `pip show`
pub struct LanguagePackageProbe {
    runner: Arc<dyn CommandRunner>,
    root: PathBuf,
}

impl LanguagePackageProbe {
    pub fn new(runner: Arc<dyn CommandRunner>, root: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            root: root.into(),
        }
    }
}

/// Pulls a "Field: value" line out of pip show output
fn show_field<'a>(output: &'a str, field: &str) -> Option<&'a str> {
    output.lines().find_map(|line| {
        let (key, value) = line.split_once(':')?;
        if key.trim().eq_ignore_ascii_case(field) {
            let value = value.trim();
            (!value.is_empty()).then_some(value)
        } else {
            None
        }
    })
}

#[async_trait]
impl Probe for LanguagePackageProbe {
    fn kind(&self) -> DependencyKind {
        DependencyKind::LanguagePackage
    }

    async fn probe(&self, descriptor: &DependencyDescriptor) -> DependencyState {
        let package = descriptor.package();
        let output = self
            .runner
            .run("pip", &["show", package], &self.root, PROBE_TIMEOUT)
            .await;
        match output {
            Ok(output) if output.success() => {
                let version = show_field(&output.stdout, "Version").map(|v| v.to_string());
                let mut state = DependencyState::detected(version, InstallMethod::Pip);
                if let Some(location) = show_field(&output.stdout, "Location") {
                    state = state.with_path(location);
                }
                state
            }
            Ok(_) => DependencyState::missing_with_note(format!("pip show found no {}", package)),
            Err(e) => {
                debug!(package, error = %e, "pip show could not run");
                DependencyState::missing_with_note("pip is not available")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Ecosystem;
    use crate::probe::tests::MockRunner;

    fn descriptor(name: &str) -> DependencyDescriptor {
        DependencyDescriptor::new(name, DependencyKind::LanguagePackage, Ecosystem::Python)
    }

    #[tokio::test]
    async fn test_detects_installed_package() {
        let runner = MockRunner::new().respond(
            "pip show requests",
            0,
            "Name: requests\nVersion: 2.25.1\nLocation: /usr/lib/python3/site-packages\n",
            "",
        );
        let probe = LanguagePackageProbe::new(Arc::new(runner), "/tmp");

        let state = probe.probe(&descriptor("requests")).await;
        assert!(state.installed);
        assert_eq!(state.version.as_deref(), Some("2.25.1"));
        assert_eq!(state.method, Some(InstallMethod::Pip));
        assert!(state.install_path.is_some());
    }

    #[tokio::test]
    async fn test_missing_when_pip_show_fails() {
        let runner = MockRunner::new().respond(
            "pip show ghost",
            1,
            "",
            "WARNING: Package(s) not found: ghost\n",
        );
        let probe = LanguagePackageProbe::new(Arc::new(runner), "/tmp");

        let state = probe.probe(&descriptor("ghost")).await;
        assert!(!state.installed);
        assert!(state.note.unwrap().contains("ghost"));
    }

    #[tokio::test]
    async fn test_missing_when_pip_absent() {
        let runner = MockRunner::new().fail_spawn("pip show requests");
        let probe = LanguagePackageProbe::new(Arc::new(runner), "/tmp");

        let state = probe.probe(&descriptor("requests")).await;
        assert!(!state.installed);
        assert_eq!(state.note.as_deref(), Some("pip is not available"));
    }

    #[tokio::test]
    async fn test_uses_package_name_override() {
        let runner =
            MockRunner::new().respond("pip show pyyaml", 0, "Name: PyYAML\nVersion: 6.0.1\n", "");
        let probe = LanguagePackageProbe::new(Arc::new(runner), "/tmp");
        let descriptor = DependencyDescriptor::new(
            "yaml",
            DependencyKind::LanguagePackage,
            Ecosystem::Python,
        )
        .with_package_name("pyyaml");

        let state = probe.probe(&descriptor).await;
        assert!(state.installed);
        assert_eq!(state.version.as_deref(), Some("6.0.1"));
    }

    #[test]
    fn test_show_field() {
        let output = "Name: requests\nVersion: 2.25.1\nSummary: HTTP for Humans\n";
        assert_eq!(show_field(output, "Version"), Some("2.25.1"));
        assert_eq!(show_field(output, "version"), Some("2.25.1"));
        assert_eq!(show_field(output, "License"), None);
    }
}
