//! System binary detection

use super::Probe;
use crate::command::{CommandRunner, PROBE_TIMEOUT};
use crate::domain::{DependencyDescriptor, DependencyKind, DependencyState, InstallMethod};
use crate::version::extract_version;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Detects binaries via `--version`, `which`, then well-known paths
///
/// Every command alias in the descriptor is tried in order; the first
/// one that answers wins.
pub struct BinaryProbe {
    runner: Arc<dyn CommandRunner>,
    root: PathBuf,
}

impl BinaryProbe {
    pub fn new(runner: Arc<dyn CommandRunner>, root: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            root: root.into(),
        }
    }

    async fn probe_command(&self, command: &str) -> Option<DependencyState> {
        let output = self
            .runner
            .run(command, &["--version"], &self.root, PROBE_TIMEOUT)
            .await;
        match output {
            Ok(output) if output.success() => {
                let version = extract_version(output.primary_output());
                let mut state = DependencyState::detected(version, InstallMethod::System);
                if let Some(path) = self.resolve_path(command).await {
                    state = state.with_path(path);
                }
                Some(state)
            }
            Ok(output) => {
                debug!(command, code = output.code, "version probe failed");
                None
            }
            Err(e) => {
                debug!(command, error = %e, "version probe could not run");
                None
            }
        }
    }

    async fn resolve_path(&self, command: &str) -> Option<PathBuf> {
        let output = self
            .runner
            .run("which", &[command], &self.root, PROBE_TIMEOUT)
            .await
            .ok()?;
        if !output.success() {
            return None;
        }
        let line = output.stdout.lines().next()?.trim();
        if line.is_empty() {
            None
        } else {
            Some(PathBuf::from(line))
        }
    }

    /// Checks well-known install locations when no command answered
    fn filesystem_fallback(&self, descriptor: &DependencyDescriptor) -> Option<DependencyState> {
        let mut locations = vec![self.root.join("bin")];
        locations.push(PathBuf::from("/usr/local/bin"));
        locations.push(PathBuf::from("/usr/bin"));
        if let Some(home) = std::env::var_os("HOME") {
            locations.push(Path::new(&home).join(".local").join("bin"));
        }

        for command in &descriptor.commands {
            for location in &locations {
                let path = location.join(command);
                if path.is_file() {
                    return Some(
                        DependencyState::detected(None, InstallMethod::System)
                            .with_path(path)
                            .with_note("found on disk but not answering --version"),
                    );
                }
            }
        }
        None
    }
}

#[async_trait]
impl Probe for BinaryProbe {
    fn kind(&self) -> DependencyKind {
        DependencyKind::Binary
    }

    async fn probe(&self, descriptor: &DependencyDescriptor) -> DependencyState {
        for command in &descriptor.commands {
            if let Some(state) = self.probe_command(command).await {
                return state;
            }
        }
        if let Some(state) = self.filesystem_fallback(descriptor) {
            return state;
        }
        DependencyState::missing_with_note(format!(
            "none of [{}] found",
            descriptor.commands.join(", ")
        ))
    }
}
