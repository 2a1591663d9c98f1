//! JSON output for machine processing

use crate::backup::BackupInfo;
use crate::domain::{BatchSummary, DependencyState, UpdateCandidate};
use crate::report::HealthReport;
use crate::update::SkipReason;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;

/// Renders engine results as pretty JSON
pub struct JsonRenderer;

#[derive(Serialize)]
struct CheckOutput<'a> {
    dependencies: BTreeMap<&'a str, &'a DependencyState>,
}

#[derive(Serialize)]
struct UpdateOutput<'a> {
    dry_run: bool,
    succeeded: usize,
    failed: usize,
    results: &'a [crate::domain::UpdateResult],
    skipped: Vec<SkippedOutput>,
}

#[derive(Serialize)]
struct SkippedOutput {
    name: String,
    current_version: String,
    reason: String,
}

#[derive(Serialize)]
struct BackupOutput<'a> {
    id: &'a str,
    created_at: String,
    files: &'a [String],
}

impl JsonRenderer {
    pub fn new() -> Self {
        Self
    }

    /// Writes probe states keyed by dependency name
    pub fn check(
        &self,
        states: &std::collections::HashMap<String, DependencyState>,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let output = CheckOutput {
            dependencies: states
                .iter()
                .map(|(name, state)| (name.as_str(), state))
                .collect(),
        };
        writeln!(writer, "{}", serde_json::to_string_pretty(&output)?)
    }

    /// Writes the candidate list
    pub fn outdated(
        &self,
        candidates: &[UpdateCandidate],
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        writeln!(writer, "{}", serde_json::to_string_pretty(candidates)?)
    }

    /// Writes the batch summary with the skip list
    pub fn update(
        &self,
        summary: &BatchSummary,
        skipped: &[(UpdateCandidate, SkipReason)],
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let output = UpdateOutput {
            dry_run: summary.dry_run,
            succeeded: summary.success_count(),
            failed: summary.failure_count(),
            results: &summary.results,
            skipped: skipped
                .iter()
                .map(|(candidate, reason)| SkippedOutput {
                    name: candidate.name.clone(),
                    current_version: candidate.current_version.clone(),
                    reason: reason.to_string(),
                })
                .collect(),
        };
        writeln!(writer, "{}", serde_json::to_string_pretty(&output)?)
    }

    /// Writes the full health report
    pub fn report(&self, report: &HealthReport, writer: &mut dyn Write) -> std::io::Result<()> {
        writeln!(writer, "{}", serde_json::to_string_pretty(report)?)
    }

    /// Writes the snapshot list
    pub fn backups(&self, backups: &[BackupInfo], writer: &mut dyn Write) -> std::io::Result<()> {
        let output: Vec<BackupOutput> = backups
            .iter()
            .map(|b| BackupOutput {
                id: &b.id,
                created_at: b.metadata.created_at.to_rfc3339(),
                files: &b.metadata.files,
            })
            .collect();
        writeln!(writer, "{}", serde_json::to_string_pretty(&output)?)
    }
}

impl Default for JsonRenderer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Ecosystem, InstallMethod, UpdateResult};
    use std::collections::HashMap;

    #[test]
    fn test_check_output_is_valid_json() {
        let mut states = HashMap::new();
        states.insert(
            "git".to_string(),
            DependencyState::detected(Some("2.43.0".to_string()), InstallMethod::System),
        );
        let mut buffer = Vec::new();
        JsonRenderer::new().check(&states, &mut buffer).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&buffer).unwrap();
        assert_eq!(value["dependencies"]["git"]["version"], "2.43.0");
    }

    #[test]
    fn test_update_output_counts() {
        let mut ok = UpdateResult::started("a", Ecosystem::Python, "1.0.0");
        ok.succeed("1.0.1");
        let mut bad = UpdateResult::started("b", Ecosystem::Python, "1.0.0");
        bad.fail("boom");
        let summary = BatchSummary::new(vec![ok, bad], false);

        let skipped = vec![(
            UpdateCandidate::classified("c", Ecosystem::Python, "1.0.0", "2.0.0"),
            SkipReason::MajorNotAllowed,
        )];

        let mut buffer = Vec::new();
        JsonRenderer::new()
            .update(&summary, &skipped, &mut buffer)
            .unwrap();

        let value: serde_json::Value = serde_json::from_slice(&buffer).unwrap();
        assert_eq!(value["succeeded"], 1);
        assert_eq!(value["failed"], 1);
        assert_eq!(value["skipped"][0]["reason"], "major updates disabled");
    }

    #[test]
    fn test_outdated_output() {
        let candidates = vec![UpdateCandidate::classified(
            "requests",
            Ecosystem::Python,
            "2.25.1",
            "2.25.2",
        )];
        let mut buffer = Vec::new();
        JsonRenderer::new().outdated(&candidates, &mut buffer).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&buffer).unwrap();
        assert_eq!(value[0]["name"], "requests");
        assert_eq!(value[0]["confidence"], "high");
    }
}
