//! Text output for human-readable display
//!
//! - Installed/missing dependency listing with colors
//! - Update candidates with confidence grading
//! - Batch results with skip reasons
//! - Health report with prioritized recommendations

use crate::backup::BackupInfo;
use crate::domain::{BatchSummary, Confidence, DependencyState, UpdateCandidate};
use crate::report::{HealthReport, Priority};
use crate::update::SkipReason;
use colored::Colorize;
use std::collections::HashMap;
use std::io::Write;

/// Renders engine results for a terminal
pub struct TextRenderer {
    verbose: bool,
}

impl TextRenderer {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// Writes probe states, missing dependencies last
    pub fn check(
        &self,
        states: &HashMap<String, DependencyState>,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let mut names: Vec<&String> = states.keys().collect();
        names.sort();

        let mut missing = 0;
        for name in &names {
            let state = &states[*name];
            if state.installed {
                let version = state.version.as_deref().unwrap_or("unknown version");
                let method = state
                    .method
                    .map(|m| format!(" via {}", m))
                    .unwrap_or_default();
                writeln!(
                    writer,
                    "  {} {} {}{}",
                    "✓".green(),
                    name,
                    version.cyan(),
                    method.dimmed()
                )?;
                if self.verbose {
                    if let Some(path) = &state.install_path {
                        writeln!(writer, "      {}", path.display().to_string().dimmed())?;
                    }
                }
            } else {
                missing += 1;
            }
        }
        for name in &names {
            let state = &states[*name];
            if !state.installed {
                let note = state
                    .note
                    .as_deref()
                    .map(|n| format!(" ({})", n))
                    .unwrap_or_default();
                writeln!(writer, "  {} {}{}", "✗".red(), name.red(), note.dimmed())?;
            }
        }
        writeln!(
            writer,
            "\n{} of {} installed",
            names.len() - missing,
            names.len()
        )
    }

    /// Writes update candidates
    pub fn outdated(
        &self,
        candidates: &[UpdateCandidate],
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let available: Vec<&UpdateCandidate> =
            candidates.iter().filter(|c| c.update_available).collect();
        if available.is_empty() {
            return writeln!(writer, "{}", "Everything is up to date.".green());
        }

        for candidate in &available {
            let confidence = match candidate.confidence {
                Confidence::High => "high".green(),
                Confidence::Medium => "medium".yellow(),
                Confidence::Low => "low".red(),
            };
            let security = if candidate.security_update {
                format!(" {}", "[security]".red().bold())
            } else {
                String::new()
            };
            writeln!(
                writer,
                "  {} {} -> {} ({} confidence){}",
                candidate.name.bold(),
                candidate.current_version,
                candidate.latest_version.cyan(),
                confidence,
                security
            )?;
        }
        writeln!(writer, "\n{} update(s) available", available.len())
    }

    /// Writes the batch summary and skip reasons
    pub fn update(
        &self,
        summary: &BatchSummary,
        skipped: &[(UpdateCandidate, SkipReason)],
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        if summary.dry_run {
            writeln!(writer, "{}", "(dry run) no changes were made".cyan())?;
        }

        for result in &summary.results {
            if result.success {
                writeln!(
                    writer,
                    "  {} {} {} -> {}",
                    "✓".green(),
                    result.dependency,
                    result.old_version,
                    result.new_version.cyan()
                )?;
            } else {
                writeln!(writer, "  {} {}", "✗".red(), result.dependency.red())?;
                for error in &result.errors {
                    writeln!(writer, "      {}", error.red())?;
                }
            }
            for warning in &result.warnings {
                writeln!(writer, "      {} {}", "warning:".yellow(), warning)?;
            }
            if self.verbose {
                for log in &result.logs {
                    writeln!(writer, "      {}", log)?;
                }
            }
        }

        if self.verbose || summary.is_empty() {
            for (candidate, reason) in skipped {
                writeln!(
                    writer,
                    "  {} {} ({})",
                    "-".dimmed(),
                    candidate.name.dimmed(),
                    reason
                )?;
            }
        }

        writeln!(
            writer,
            "\n{} updated, {} failed, {} skipped",
            summary.success_count(),
            summary.failure_count(),
            skipped.len()
        )
    }

    /// Writes the health report
    pub fn report(&self, report: &HealthReport, writer: &mut dyn Write) -> std::io::Result<()> {
        let score = report.health_score;
        let score_colored = if score >= 80 {
            score.to_string().green()
        } else if score >= 50 {
            score.to_string().yellow()
        } else {
            score.to_string().red()
        };
        writeln!(writer, "Health score: {}/100", score_colored.bold())?;
        writeln!(
            writer,
            "Dependencies: {}/{} installed",
            report.installed_count, report.total_dependencies
        )?;

        for (ecosystem, coverage) in &report.ecosystem_coverage {
            writeln!(
                writer,
                "  {}: {}/{}",
                ecosystem, coverage.installed, coverage.total
            )?;
        }

        if !report.critical_missing.is_empty() {
            writeln!(
                writer,
                "\n{} {}",
                "Missing critical:".red().bold(),
                report.critical_missing.join(", ")
            )?;
        }
        if !report.constraint_violations.is_empty() {
            writeln!(writer, "\n{}", "Version constraint violations:".yellow())?;
            for violation in &report.constraint_violations {
                writeln!(writer, "  {}", violation)?;
            }
        }

        if !report.recommendations.is_empty() {
            writeln!(writer, "\nRecommendations:")?;
            for rec in &report.recommendations {
                let tag = match rec.priority {
                    Priority::Critical => "[critical]".red().bold(),
                    Priority::High => "[high]".yellow(),
                    Priority::Medium => "[medium]".normal(),
                    Priority::Low => "[low]".dimmed(),
                };
                writeln!(writer, "  {} {}", tag, rec.message)?;
            }
        }
        Ok(())
    }

    /// Writes the snapshot list, newest first
    pub fn backups(&self, backups: &[BackupInfo], writer: &mut dyn Write) -> std::io::Result<()> {
        if backups.is_empty() {
            return writeln!(writer, "No backups found.");
        }
        for backup in backups {
            writeln!(
                writer,
                "  {}  {} file(s)  {}",
                backup.id.bold(),
                backup.metadata.files.len(),
                backup
                    .metadata
                    .created_at
                    .format("%Y-%m-%d %H:%M:%S UTC")
                    .to_string()
                    .dimmed()
            )?;
        }
        Ok(())
    }
}
