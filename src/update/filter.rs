//! Update policy filtering
//!
//! Partitions candidates into the ones the configured policy allows and
//! the ones it skips, with a reason for every skip. Security-flagged
//! updates bypass the patch/minor gates; major updates stay behind the
//! major gate regardless.

use crate::domain::{UpdateCandidate, UpdateConfig};
use crate::version::{update_size, UpdateSize};
use std::fmt;

/// Why a candidate was not selected for updating
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Already at the latest version
    NoUpdate,
    /// Listed in exclude_packages
    Excluded,
    /// Major update and auto_update_major is off
    MajorNotAllowed,
    /// Minor update and auto_update_minor is off
    MinorNotAllowed,
    /// Patch update and auto_update_patch is off
    PatchNotAllowed,
    /// Dev dependency and skip_dev_dependencies is on
    DevSkipped,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            SkipReason::NoUpdate => "already up to date",
            SkipReason::Excluded => "excluded by configuration",
            SkipReason::MajorNotAllowed => "major updates disabled",
            SkipReason::MinorNotAllowed => "minor updates disabled",
            SkipReason::PatchNotAllowed => "patch updates disabled",
            SkipReason::DevSkipped => "dev dependencies skipped",
        };
        write!(f, "{}", reason)
    }
}

/// Applies an [`UpdateConfig`] to a candidate list
pub struct CandidateFilter<'a> {
    config: &'a UpdateConfig,
}

impl<'a> CandidateFilter<'a> {
    pub fn new(config: &'a UpdateConfig) -> Self {
        Self { config }
    }

    /// Splits candidates into selected updates and skipped ones
    pub fn plan(
        &self,
        candidates: Vec<UpdateCandidate>,
    ) -> (Vec<UpdateCandidate>, Vec<(UpdateCandidate, SkipReason)>) {
        let mut selected = Vec::new();
        let mut skipped = Vec::new();
        for candidate in candidates {
            match self.judge(&candidate) {
                None => selected.push(candidate),
                Some(reason) => skipped.push((candidate, reason)),
            }
        }
        (selected, skipped)
    }

    fn judge(&self, candidate: &UpdateCandidate) -> Option<SkipReason> {
        if !candidate.update_available {
            return Some(SkipReason::NoUpdate);
        }
        if self.config.exclude_packages.contains(&candidate.name) {
            return Some(SkipReason::Excluded);
        }
        if candidate.is_dev && self.config.skip_dev_dependencies {
            return Some(SkipReason::DevSkipped);
        }
        if candidate.major_update {
            // Majors stay gated even for security updates
            return (!self.config.auto_update_major).then_some(SkipReason::MajorNotAllowed);
        }
        if candidate.security_update {
            // Non-major security fixes bypass the patch/minor policy
            return None;
        }
        match update_size(&candidate.current_version, &candidate.latest_version) {
            Some(UpdateSize::Minor) => {
                (!self.config.auto_update_minor).then_some(SkipReason::MinorNotAllowed)
            }
            Some(UpdateSize::Patch) | None => {
                (!self.config.auto_update_patch).then_some(SkipReason::PatchNotAllowed)
            }
            Some(UpdateSize::Major) => {
                (!self.config.auto_update_major).then_some(SkipReason::MajorNotAllowed)
            }
        }
    }
}
