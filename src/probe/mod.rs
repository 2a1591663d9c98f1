//! Dependency detection probes
//!
//! Each [`DependencyKind`] has a probe variant that knows how to detect
//! installations of that kind. Probes are infallible by design: every
//! failure mode (command missing, timeout, unparseable output) degrades
//! to a missing state with a note, never an error.

mod binary;
mod language;
mod pm_global;
mod pm_local;

pub use binary::BinaryProbe;
pub use language::LanguagePackageProbe;
pub use pm_global::GlobalPackageProbe;
pub use pm_local::LocalPackageProbe;

use crate::command::CommandRunner;
use crate::domain::{DependencyDescriptor, DependencyKind, DependencyState};
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

/// Detects whether a dependency of one kind is installed
#[async_trait]
pub trait Probe: Send + Sync {
    /// The dependency kind this probe handles
    fn kind(&self) -> DependencyKind;

    /// Probes for the dependency, degrading failures to a missing state
    async fn probe(&self, descriptor: &DependencyDescriptor) -> DependencyState;
}

/// Specialized tools may be a binary on PATH or an npm global install;
/// try the binary probe first and fall through to the global one
pub struct SpecializedToolProbe {
    binary: BinaryProbe,
    global: GlobalPackageProbe,
}

impl SpecializedToolProbe {
    pub fn new(runner: Arc<dyn CommandRunner>, root: &Path) -> Self {
        Self {
            binary: BinaryProbe::new(runner.clone(), root),
            global: GlobalPackageProbe::new(runner, root),
        }
    }
}

#[async_trait]
impl Probe for SpecializedToolProbe {
    fn kind(&self) -> DependencyKind {
        DependencyKind::SpecializedTool
    }

    async fn probe(&self, descriptor: &DependencyDescriptor) -> DependencyState {
        let state = self.binary.probe(descriptor).await;
        if state.installed {
            return state;
        }
        self.global.probe(descriptor).await
    }
}

/// Builds the probe for a dependency kind
pub fn probe_for_kind(
    kind: DependencyKind,
    runner: Arc<dyn CommandRunner>,
    root: &Path,
) -> Box<dyn Probe> {
    match kind {
        DependencyKind::Binary => Box::new(BinaryProbe::new(runner, root)),
        DependencyKind::LanguagePackage => Box::new(LanguagePackageProbe::new(runner, root)),
        DependencyKind::PackageManagerGlobal => Box::new(GlobalPackageProbe::new(runner, root)),
        DependencyKind::PackageManagerLocal => Box::new(LocalPackageProbe::new(runner, root)),
        DependencyKind::SpecializedTool => Box::new(SpecializedToolProbe::new(runner, root)),
    }
}

/// Extracts a package's version from `npm list --json` output
pub(crate) fn npm_listed_version(stdout: &str, package: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(stdout).ok()?;
    value
        .get("dependencies")?
        .get(package)?
        .get("version")?
        .as_str()
        .map(|v| v.to_string())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::command::{CommandError, CommandOutput, CommandRunner};
    use crate::domain::Ecosystem;
    use std::collections::HashMap;
    use std::time::Duration;

    /// Mock runner answering canned responses keyed on the rendered command
    pub struct MockRunner {
        responses: HashMap<String, (i32, String, String)>,
        spawn_failures: Vec<String>,
    }

    impl MockRunner {
        pub fn new() -> Self {
            Self {
                responses: HashMap::new(),
                spawn_failures: Vec::new(),
            }
        }

        pub fn respond(mut self, command: &str, code: i32, stdout: &str, stderr: &str) -> Self {
            self.responses.insert(
                command.to_string(),
                (code, stdout.to_string(), stderr.to_string()),
            );
            self
        }

        pub fn fail_spawn(mut self, command: &str) -> Self {
            self.spawn_failures.push(command.to_string());
            self
        }
    }

    #[async_trait]
    impl CommandRunner for MockRunner {
        async fn run(
            &self,
            program: &str,
            args: &[&str],
            _cwd: &Path,
            _timeout: Duration,
        ) -> Result<CommandOutput, CommandError> {
            let rendered = crate::command::render_command(program, args);
            if self.spawn_failures.contains(&rendered) {
                return Err(CommandError::Spawn {
                    command: rendered,
                    source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
                });
            }
            match self.responses.get(&rendered) {
                Some((code, stdout, stderr)) => Ok(CommandOutput {
                    code: *code,
                    stdout: stdout.clone(),
                    stderr: stderr.clone(),
                }),
                None => Err(CommandError::Spawn {
                    command: rendered,
                    source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
                }),
            }
        }
    }

    #[test]
    fn test_npm_listed_version() {
        let json = r#"{"dependencies": {"express": {"version": "4.18.2"}}}"#;
        assert_eq!(
            npm_listed_version(json, "express"),
            Some("4.18.2".to_string())
        );
        assert_eq!(npm_listed_version(json, "lodash"), None);
        assert_eq!(npm_listed_version("not json", "express"), None);
        assert_eq!(npm_listed_version("{}", "express"), None);
    }

    #[tokio::test]
    async fn test_probe_for_kind_dispatch() {
        let runner: Arc<dyn CommandRunner> = Arc::new(MockRunner::new());
        for kind in DependencyKind::all() {
            let probe = probe_for_kind(*kind, runner.clone(), Path::new("/tmp"));
            assert_eq!(probe.kind(), *kind);
        }
    }

    #[tokio::test]
    async fn test_specialized_tool_falls_through_to_global() {
        let runner = MockRunner::new().respond(
            "npm list -g aicli --depth=0 --json",
            0,
            r#"{"dependencies": {"aicli": {"version": "1.2.0"}}}"#,
            "",
        );
        let dir = tempfile::tempdir().unwrap();
        let probe = SpecializedToolProbe::new(Arc::new(runner), dir.path());
        let descriptor = DependencyDescriptor::new(
            "aicli",
            DependencyKind::SpecializedTool,
            Ecosystem::Node,
        );

        let state = probe.probe(&descriptor).await;
        assert!(state.installed);
        assert_eq!(state.version.as_deref(), Some("1.2.0"));
    }

    #[tokio::test]
    async fn test_specialized_tool_prefers_binary() {
        let runner = MockRunner::new().respond("aicli --version", 0, "aicli 2.0.0\n", "");
        let dir = tempfile::tempdir().unwrap();
        let probe = SpecializedToolProbe::new(Arc::new(runner), dir.path());
        let descriptor = DependencyDescriptor::new(
            "aicli",
            DependencyKind::SpecializedTool,
            Ecosystem::Node,
        );

        let state = probe.probe(&descriptor).await;
        assert!(state.installed);
        assert_eq!(state.version.as_deref(), Some("2.0.0"));
    }
}
