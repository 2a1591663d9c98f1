//! Version parsing, comparison and update classification
//!
//! Versions in the wild rarely follow strict semver (Python packages use
//! PEP 440, tools print "v1.2.3" or "git version 2.43.0"), so comparison
//! works on a lenient numeric normalization with a lexical fallback.

use crate::domain::Confidence;
use regex::Regex;
use std::cmp::Ordering;
use std::sync::OnceLock;

/// Parses a version string into (major, minor, patch)
///
/// Leading non-digit prefixes are skipped, pre-release/build suffixes
/// (after '-' or '+') are cut, and missing components default to zero.
/// Returns None when no leading numeric component can be found.
pub fn normalize(version: &str) -> Option<(u64, u64, u64)> {
    let start = version.find(|c: char| c.is_ascii_digit())?;
    let trimmed = &version[start..];
    let core = trimmed
        .split(['-', '+'])
        .next()
        .unwrap_or(trimmed);

    let mut parts = core.split('.').map(|part| {
        let digits: String = part.chars().take_while(|c| c.is_ascii_digit()).collect();
        digits.parse::<u64>().ok()
    });

    let major = parts.next().flatten()?;
    let minor = parts.next().flatten().unwrap_or(0);
    let patch = parts.next().flatten().unwrap_or(0);
    Some((major, minor, patch))
}

/// Compares two version strings
///
/// Both parseable: numeric tuple comparison. Otherwise a lexical
/// comparison so the ordering stays total.
pub fn compare(a: &str, b: &str) -> Ordering {
    match (normalize(a), normalize(b)) {
        (Some(va), Some(vb)) => va.cmp(&vb),
        _ => a.cmp(b),
    }
}

/// Returns the major component of a version, when parseable
pub fn major_of(version: &str) -> Option<u64> {
    normalize(version).map(|(major, _, _)| major)
}

/// Granularity of an available update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateSize {
    Major,
    Minor,
    Patch,
}

/// Classifies the distance between two parseable versions
pub fn update_size(current: &str, latest: &str) -> Option<UpdateSize> {
    let (cmaj, cmin, _) = normalize(current)?;
    let (lmaj, lmin, _) = normalize(latest)?;
    if lmaj != cmaj {
        Some(UpdateSize::Major)
    } else if lmin != cmin {
        Some(UpdateSize::Minor)
    } else {
        Some(UpdateSize::Patch)
    }
}

/// Derived facts about a current/latest version pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub update_available: bool,
    pub major_update: bool,
    pub confidence: Confidence,
}

/// Classifies an update candidate from its version pair
///
/// Confidence is graded by how many major versions the update skips:
/// zero is High, exactly one is Medium, two or more is Low. Pairs that
/// cannot be parsed numerically are graded Low whenever the strings
/// differ.
pub fn classify(current: &str, latest: &str) -> Classification {
    let update_available = compare(current, latest) == Ordering::Less;

    match (normalize(current), normalize(latest)) {
        (Some((cmaj, _, _)), Some((lmaj, _, _))) => {
            let major_update = update_available && lmaj > cmaj;
            let confidence = if !major_update {
                Confidence::High
            } else if lmaj - cmaj == 1 {
                Confidence::Medium
            } else {
                Confidence::Low
            };
            Classification {
                update_available,
                major_update,
                confidence,
            }
        }
        _ => Classification {
            update_available,
            major_update: false,
            confidence: if update_available {
                Confidence::Low
            } else {
                Confidence::High
            },
        },
    }
}

static VERSION_PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();

fn version_patterns() -> &'static [Regex] {
    VERSION_PATTERNS.get_or_init(|| {
        [
            r"(\d+\.\d+\.\d+(?:[-+][0-9A-Za-z.-]+)?)",
            r"version\s+(\d+\.\d+(?:\.\d+)?)",
            r"v(\d+\.\d+(?:\.\d+)?)",
            r"(\d+\.\d+)",
        ]
        .iter()
        .map(|p| Regex::new(p).expect("version pattern is valid"))
        .collect()
    })
}

/// Extracts a version number from tool output such as "git version 2.43.0"
pub fn extract_version(output: &str) -> Option<String> {
    let line = output.lines().find(|l| !l.trim().is_empty())?;
    for pattern in version_patterns() {
        if let Some(captures) = pattern.captures(line) {
            return Some(captures.get(1)?.as_str().to_string());
        }
    }
    None
}
