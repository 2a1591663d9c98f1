//! Update candidates produced by the outdated check

use super::Ecosystem;
use crate::version::{self, Classification};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Confidence that applying an update is safe
///
/// Confidence never increases as the number of skipped major versions
/// grows: non-major updates are High, one major ahead is Medium, two or
/// more (or unparseable versions) are Low.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Confidence::High => "high",
            Confidence::Medium => "medium",
            Confidence::Low => "low",
        };
        write!(f, "{}", name)
    }
}

/// A package with a known installed version and a known latest version
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateCandidate {
    /// Package name
    pub name: String,
    /// Which package universe this candidate lives in
    pub ecosystem: Ecosystem,
    /// Currently installed version
    pub current_version: String,
    /// Latest version known upstream
    pub latest_version: String,
    /// Whether the latest version differs from the current one
    pub update_available: bool,
    /// Whether applying the update crosses a major version boundary
    pub major_update: bool,
    /// Whether the installed version is flagged by a security audit
    pub security_update: bool,
    /// How safe the update is judged to be
    pub confidence: Confidence,
    /// Whether the package is a development-only dependency
    pub is_dev: bool,
}

impl UpdateCandidate {
    /// Builds a candidate, deriving availability, majorness and
    /// confidence from the version pair
    pub fn classified(
        name: impl Into<String>,
        ecosystem: Ecosystem,
        current_version: impl Into<String>,
        latest_version: impl Into<String>,
    ) -> Self {
        let current_version = current_version.into();
        let latest_version = latest_version.into();
        let Classification {
            update_available,
            major_update,
            confidence,
        } = version::classify(&current_version, &latest_version);
        Self {
            name: name.into(),
            ecosystem,
            current_version,
            latest_version,
            update_available,
            major_update,
            security_update: false,
            confidence,
            is_dev: false,
        }
    }

    /// Marks this candidate as flagged by a security audit (builder pattern)
    pub fn flagged_security(mut self) -> Self {
        self.security_update = true;
        self
    }

    /// Marks this candidate as a dev dependency (builder pattern)
    pub fn dev(mut self) -> Self {
        self.is_dev = true;
        self
    }

    /// Returns true when the update is available and does not cross a major
    pub fn is_safe(&self) -> bool {
        self.update_available && !self.major_update
    }
}

impl fmt::Display for UpdateCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} -> {} ({} confidence)",
            self.name, self.current_version, self.latest_version, self.confidence
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_update_is_high_confidence() {
        let c = UpdateCandidate::classified("requests", Ecosystem::Python, "2.25.1", "2.25.2");
        assert!(c.update_available);
        assert!(!c.major_update);
        assert_eq!(c.confidence, Confidence::High);
        assert!(c.is_safe());
    }

    #[test]
    fn test_no_update_when_versions_equal() {
        let c = UpdateCandidate::classified("express", Ecosystem::Node, "4.18.2", "4.18.2");
        assert!(!c.update_available);
        assert!(!c.is_safe());
        assert_eq!(c.confidence, Confidence::High);
    }

    #[test]
    fn test_one_major_ahead_is_medium() {
        let c = UpdateCandidate::classified("click", Ecosystem::Python, "7.1.2", "8.1.7");
        assert!(c.major_update);
        assert_eq!(c.confidence, Confidence::Medium);
        assert!(!c.is_safe());
    }

    #[test]
    fn test_multiple_majors_ahead_is_low() {
        let c = UpdateCandidate::classified("lodash", Ecosystem::Node, "1.0.0", "4.0.0");
        assert!(c.major_update);
        assert_eq!(c.confidence, Confidence::Low);
    }

    #[test]
    fn test_confidence_ordering() {
        assert!(Confidence::High > Confidence::Medium);
        assert!(Confidence::Medium > Confidence::Low);
    }

    #[test]
    fn test_security_flag_builder() {
        let c = UpdateCandidate::classified("urllib3", Ecosystem::Python, "1.26.0", "1.26.18")
            .flagged_security();
        assert!(c.security_update);
    }

    #[test]
    fn test_dev_builder() {
        let c = UpdateCandidate::classified("pytest", Ecosystem::Python, "7.0.0", "7.4.4").dev();
        assert!(c.is_dev);
    }

    #[test]
    fn test_display() {
        let c = UpdateCandidate::classified("requests", Ecosystem::Python, "2.25.1", "2.25.2");
        assert_eq!(
            format!("{}", c),
            "requests: 2.25.1 -> 2.25.2 (high confidence)"
        );
    }

    #[test]
    fn test_serde_confidence() {
        assert_eq!(
            serde_json::to_string(&Confidence::Medium).unwrap(),
            "\"medium\""
        );
    }
}
