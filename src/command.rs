//! Async subprocess execution seam
//!
//! All external tooling (pip, npm, poetry, audit tools, version probes)
//! goes through the [`CommandRunner`] trait so the rest of the engine can
//! be tested against mock runners without touching the system.

use crate::error::TimeoutError;
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

/// Captured output of a finished command
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Process exit code (-1 when terminated by a signal)
    pub code: i32,
    /// Captured stdout
    pub stdout: String,
    /// Captured stderr
    pub stderr: String,
}

impl CommandOutput {
    /// Returns true when the command exited with status zero
    pub fn success(&self) -> bool {
        self.code == 0
    }

    /// Returns stdout, falling back to stderr when stdout is empty
    ///
    /// Some tools (python --version on older releases, npm warnings)
    /// write their useful output to stderr.
    pub fn primary_output(&self) -> &str {
        if self.stdout.trim().is_empty() {
            &self.stderr
        } else {
            &self.stdout
        }
    }
}

/// Errors from running an external command
#[derive(Error, Debug)]
pub enum CommandError {
    /// The command could not be spawned (usually: not installed)
    #[error("failed to spawn '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The command exceeded its time budget and was killed
    #[error(transparent)]
    Timeout(#[from] TimeoutError),
}

/// Executes external commands with a working directory and time budget
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Runs a command to completion, capturing its output
    async fn run(
        &self,
        program: &str,
        args: &[&str],
        cwd: &Path,
        timeout: Duration,
    ) -> Result<CommandOutput, CommandError>;
}

/// Real command runner backed by tokio subprocesses
#[derive(Debug, Default, Clone)]
pub struct SystemCommandRunner;

impl SystemCommandRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for SystemCommandRunner {
    async fn run(
        &self,
        program: &str,
        args: &[&str],
        cwd: &Path,
        timeout: Duration,
    ) -> Result<CommandOutput, CommandError> {
        let rendered = render_command(program, args);
        debug!(command = %rendered, cwd = %cwd.display(), "running command");

        let child = Command::new(program)
            .args(args)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| CommandError::Spawn {
                command: rendered.clone(),
                source: e,
            })?;

        let output = tokio::time::timeout(timeout, child.wait_with_output())
            .await
            .map_err(|_| TimeoutError::command(rendered.clone(), timeout.as_secs()))?
            .map_err(|e| CommandError::Spawn {
                command: rendered,
                source: e,
            })?;

        Ok(CommandOutput {
            code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Renders a command line for logs and error messages
pub fn render_command(program: &str, args: &[&str]) -> String {
    if args.is_empty() {
        program.to_string()
    } else {
        format!("{} {}", program, args.join(" "))
    }
}

/// Time budget for quick availability and version probes
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Returns true when a program answers `--version` within the probe budget
pub async fn command_available(runner: &dyn CommandRunner, program: &str, cwd: &Path) -> bool {
    matches!(
        runner.run(program, &["--version"], cwd, PROBE_TIMEOUT).await,
        Ok(output) if output.success()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_command_output_success() {
        let ok = CommandOutput {
            code: 0,
            stdout: String::new(),
            stderr: String::new(),
        };
        assert!(ok.success());

        let failed = CommandOutput {
            code: 1,
            stdout: String::new(),
            stderr: String::new(),
        };
        assert!(!failed.success());
    }

    #[test]
    fn test_primary_output_prefers_stdout() {
        let output = CommandOutput {
            code: 0,
            stdout: "2.43.0\n".to_string(),
            stderr: "warning\n".to_string(),
        };
        assert_eq!(output.primary_output(), "2.43.0\n");
    }

    #[test]
    fn test_primary_output_falls_back_to_stderr() {
        let output = CommandOutput {
            code: 0,
            stdout: "  \n".to_string(),
            stderr: "Python 2.7.18\n".to_string(),
        };
        assert_eq!(output.primary_output(), "Python 2.7.18\n");
    }

    #[test]
    fn test_render_command() {
        assert_eq!(render_command("git", &[]), "git");
        assert_eq!(
            render_command("npm", &["install", "-g", "x"]),
            "npm install -g x"
        );
    }

    #[tokio::test]
    async fn test_spawn_error_for_missing_program() {
        let runner = SystemCommandRunner::new();
        let result = runner
            .run(
                "definitely-not-a-real-program-xyz",
                &["--version"],
                &PathBuf::from("."),
                Duration::from_secs(1),
            )
            .await;
        assert!(matches!(result, Err(CommandError::Spawn { .. })));
    }

    #[tokio::test]
    async fn test_command_available_false_for_missing_program() {
        let runner = SystemCommandRunner::new();
        assert!(
            !command_available(&runner, "definitely-not-a-real-program-xyz", Path::new("."))
                .await
        );
    }
}
