//! Project dependency health report
//!
//! Folds probe states and update candidates into a single score with
//! prioritized recommendations. Missing critical tooling dominates the
//! score; pending security updates weigh more than routine ones.

use crate::domain::{
    Confidence, DependencyCatalog, DependencyState, Ecosystem, UpdateCandidate,
};
use chrono::{DateTime, Utc};
use semver::{Version, VersionReq};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use tracing::debug;

const CRITICAL_MISSING_PENALTY: u32 = 25;
const SECURITY_PENDING_PENALTY: u32 = 10;
const ROUTINE_PENDING_PENALTY: u32 = 2;

/// How urgently a recommendation should be acted on
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Critical,
    High,
    Medium,
    Low,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Priority::Critical => "critical",
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        };
        write!(f, "{}", name)
    }
}

/// One actionable recommendation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub priority: Priority,
    /// Short action keyword (install, update, review)
    pub action: String,
    pub message: String,
}

/// Per-ecosystem installed/total counts
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EcosystemCoverage {
    pub total: usize,
    pub installed: usize,
}

/// The full health report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    pub generated_at: DateTime<Utc>,
    /// 0..=100 score, higher is healthier
    pub health_score: u8,
    pub total_dependencies: usize,
    pub installed_count: usize,
    /// Names of critical dependencies that are missing
    pub critical_missing: Vec<String>,
    /// Names of non-critical dependencies that are missing
    pub missing: Vec<String>,
    pub ecosystem_coverage: BTreeMap<String, EcosystemCoverage>,
    /// Probe states keyed by dependency name (stable order for output)
    pub states: BTreeMap<String, DependencyState>,
    /// Update candidates with an update available
    pub candidates: Vec<UpdateCandidate>,
    /// Installed versions that violate their declared constraint
    pub constraint_violations: Vec<String>,
    pub recommendations: Vec<Recommendation>,
}

/// Builds a health report from probe and check results
pub fn build_report(
    catalog: &DependencyCatalog,
    states: &HashMap<String, DependencyState>,
    candidates: &[UpdateCandidate],
) -> HealthReport {
    let mut critical_missing = Vec::new();
    let mut missing = Vec::new();
    let mut installed_count = 0;
    let mut coverage: BTreeMap<String, EcosystemCoverage> = BTreeMap::new();
    let mut constraint_violations = Vec::new();

    for descriptor in catalog.iter() {
        let state = states.get(&descriptor.name);
        let installed = state.map(|s| s.installed).unwrap_or(false);
        let entry = coverage
            .entry(descriptor.ecosystem.display_name().to_string())
            .or_default();
        entry.total += 1;
        if installed {
            entry.installed += 1;
            installed_count += 1;
            if let (Some(constraint), Some(version)) = (
                descriptor.required_version.as_deref(),
                state.and_then(|s| s.version.as_deref()),
            ) {
                if violates_constraint(version, constraint) {
                    constraint_violations.push(format!(
                        "{}: installed {} does not satisfy {}",
                        descriptor.name, version, constraint
                    ));
                }
            }
        } else if descriptor.critical {
            critical_missing.push(descriptor.name.clone());
        } else {
            missing.push(descriptor.name.clone());
        }
    }
    critical_missing.sort();
    missing.sort();

    let pending: Vec<&UpdateCandidate> =
        candidates.iter().filter(|c| c.update_available).collect();
    let security_pending = pending.iter().filter(|c| c.security_update).count() as u32;
    let routine_pending = pending.len() as u32 - security_pending;

    let total = catalog.len();
    let base = if total == 0 {
        100
    } else {
        (installed_count * 100 / total) as u32
    };
    let health_score = base
        .saturating_sub(critical_missing.len() as u32 * CRITICAL_MISSING_PENALTY)
        .saturating_sub(security_pending * SECURITY_PENDING_PENALTY)
        .saturating_sub(routine_pending * ROUTINE_PENDING_PENALTY)
        .min(100) as u8;

    let recommendations = build_recommendations(
        &critical_missing,
        &missing,
        &constraint_violations,
        &pending,
    );
    debug!(health_score, "built health report");

    HealthReport {
        generated_at: Utc::now(),
        health_score,
        total_dependencies: total,
        installed_count,
        critical_missing,
        missing,
        ecosystem_coverage: coverage,
        states: states
            .iter()
            .map(|(name, state)| (name.clone(), state.clone()))
            .collect(),
        candidates: candidates.to_vec(),
        constraint_violations,
        recommendations,
    }
}

/// Checks an installed version against a semver requirement
///
/// Unparseable versions or constraints never count as violations.
fn violates_constraint(version: &str, constraint: &str) -> bool {
    let Some((major, minor, patch)) = crate::version::normalize(version) else {
        return false;
    };
    let Ok(requirement) = VersionReq::parse(constraint) else {
        return false;
    };
    !requirement.matches(&Version::new(major, minor, patch))
}

fn build_recommendations(
    critical_missing: &[String],
    missing: &[String],
    constraint_violations: &[String],
    pending: &[&UpdateCandidate],
) -> Vec<Recommendation> {
    let mut recommendations = Vec::new();

    for name in critical_missing {
        recommendations.push(Recommendation {
            priority: Priority::Critical,
            action: "install".to_string(),
            message: format!("install missing critical dependency '{}'", name),
        });
    }
    for candidate in pending.iter().filter(|c| c.security_update) {
        recommendations.push(Recommendation {
            priority: Priority::Critical,
            action: "update".to_string(),
            message: format!(
                "security update for '{}': {} -> {}",
                candidate.name, candidate.current_version, candidate.latest_version
            ),
        });
    }
    for candidate in pending
        .iter()
        .filter(|c| !c.security_update && c.confidence == Confidence::High)
    {
        recommendations.push(Recommendation {
            priority: Priority::High,
            action: "update".to_string(),
            message: format!(
                "safe update for '{}': {} -> {}",
                candidate.name, candidate.current_version, candidate.latest_version
            ),
        });
    }
    for name in missing {
        recommendations.push(Recommendation {
            priority: Priority::Medium,
            action: "install".to_string(),
            message: format!("'{}' is declared but not installed", name),
        });
    }
    for violation in constraint_violations {
        recommendations.push(Recommendation {
            priority: Priority::Medium,
            action: "update".to_string(),
            message: violation.clone(),
        });
    }
    for candidate in pending
        .iter()
        .filter(|c| !c.security_update && c.major_update)
    {
        recommendations.push(Recommendation {
            priority: Priority::Low,
            action: "review".to_string(),
            message: format!(
                "major update available for '{}': {} -> {}",
                candidate.name, candidate.current_version, candidate.latest_version
            ),
        });
    }
    recommendations
}
