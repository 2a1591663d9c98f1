//! Best-effort security audit integration
//!
//! Wraps pip-audit and npm audit. Audit failures never fail a check run;
//! they are logged and the security flags are simply absent.

use crate::command::{CommandError, CommandRunner};
use crate::domain::Ecosystem;
use crate::error::SecurityCheckError;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

const AUDIT_TIMEOUT: Duration = Duration::from_secs(60);

/// Runs ecosystem audit tools and collects vulnerable package names
pub struct SecurityAuditor {
    runner: Arc<dyn CommandRunner>,
    root: PathBuf,
}

impl SecurityAuditor {
    pub fn new(runner: Arc<dyn CommandRunner>, root: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            root: root.into(),
        }
    }

    /// Returns the packages flagged by the ecosystem's audit tool
    ///
    /// Best-effort: an unavailable or failing audit tool yields an empty
    /// set, with the reason logged.
    pub async fn flagged_packages(&self, ecosystem: Ecosystem) -> HashSet<String> {
        match self.audit(ecosystem).await {
            Ok(flagged) => flagged,
            Err(e) => {
                debug!(%ecosystem, error = %e, "security audit unavailable");
                HashSet::new()
            }
        }
    }

    async fn audit(&self, ecosystem: Ecosystem) -> Result<HashSet<String>, SecurityCheckError> {
        match ecosystem {
            Ecosystem::Python => self.audit_python().await,
            Ecosystem::Node => self.audit_node().await,
        }
    }

    async fn audit_python(&self) -> Result<HashSet<String>, SecurityCheckError> {
        let output = self
            .runner
            .run(
                "pip-audit",
                &["--format", "json"],
                &self.root,
                AUDIT_TIMEOUT,
            )
            .await
            .map_err(|e| match e {
                CommandError::Spawn { .. } => SecurityCheckError::ToolUnavailable {
                    tool: "pip-audit".to_string(),
                },
                CommandError::Timeout(t) => SecurityCheckError::AuditFailed {
                    ecosystem: Ecosystem::Python,
                    message: t.to_string(),
                },
            })?;

        // pip-audit exits nonzero when vulnerabilities are found; the
        // JSON is present either way
        let value: serde_json::Value =
            serde_json::from_str(&output.stdout).map_err(|e| SecurityCheckError::AuditFailed {
                ecosystem: Ecosystem::Python,
                message: e.to_string(),
            })?;

        let mut flagged = HashSet::new();
        if let Some(deps) = value.get("dependencies").and_then(|d| d.as_array()) {
            for dep in deps {
                let has_vulns = dep
                    .get("vulns")
                    .and_then(|v| v.as_array())
                    .map(|v| !v.is_empty())
                    .unwrap_or(false);
                if has_vulns {
                    if let Some(name) = dep.get("name").and_then(|n| n.as_str()) {
                        flagged.insert(name.to_string());
                    }
                }
            }
        }
        Ok(flagged)
    }

    async fn audit_node(&self) -> Result<HashSet<String>, SecurityCheckError> {
        let output = self
            .runner
            .run("npm", &["audit", "--json"], &self.root, AUDIT_TIMEOUT)
            .await
            .map_err(|e| match e {
                CommandError::Spawn { .. } => SecurityCheckError::ToolUnavailable {
                    tool: "npm".to_string(),
                },
                CommandError::Timeout(t) => SecurityCheckError::AuditFailed {
                    ecosystem: Ecosystem::Node,
                    message: t.to_string(),
                },
            })?;

        // npm audit exits 1 when vulnerabilities exist; parse regardless
        let value: serde_json::Value =
            serde_json::from_str(&output.stdout).map_err(|e| SecurityCheckError::AuditFailed {
                ecosystem: Ecosystem::Node,
                message: e.to_string(),
            })?;

        let mut flagged = HashSet::new();
        if let Some(vulns) = value.get("vulnerabilities").and_then(|v| v.as_object()) {
            flagged.extend(vulns.keys().cloned());
        }
        Ok(flagged)
    }
}
