//! Observed installation state of a dependency

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// The mechanism through which an installed dependency was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallMethod {
    /// Binary on PATH or in a well-known system location
    System,
    /// pip-managed Python package
    Pip,
    /// poetry-managed Python package
    Poetry,
    /// pipenv-managed Python package
    Pipenv,
    /// npm global install
    NpmGlobal,
    /// npm project-local install
    NpmLocal,
    /// yarn project-local install
    Yarn,
    /// pnpm project-local install
    Pnpm,
}

impl fmt::Display for InstallMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InstallMethod::System => "system",
            InstallMethod::Pip => "pip",
            InstallMethod::Poetry => "poetry",
            InstallMethod::Pipenv => "pipenv",
            InstallMethod::NpmGlobal => "npm (global)",
            InstallMethod::NpmLocal => "npm",
            InstallMethod::Yarn => "yarn",
            InstallMethod::Pnpm => "pnpm",
        };
        write!(f, "{}", name)
    }
}

/// What a probe observed about one dependency at one point in time
///
/// A state where `installed` is false never carries a version; the
/// constructors enforce this.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependencyState {
    /// Whether the dependency was found
    pub installed: bool,
    /// Detected version, when one could be extracted
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub version: Option<String>,
    /// How the installation was found
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub method: Option<InstallMethod>,
    /// Path to the installed artifact, when known
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub install_path: Option<PathBuf>,
    /// When this probe ran
    pub probed_at: DateTime<Utc>,
    /// Free-form note (probe fallback used, version unreadable, ...)
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub note: Option<String>,
}

impl DependencyState {
    /// Creates a state for a dependency that was found
    pub fn detected(version: Option<String>, method: InstallMethod) -> Self {
        Self {
            installed: true,
            version,
            method: Some(method),
            install_path: None,
            probed_at: Utc::now(),
            note: None,
        }
    }

    /// Creates a state for a dependency that was not found
    pub fn missing() -> Self {
        Self {
            installed: false,
            version: None,
            method: None,
            install_path: None,
            probed_at: Utc::now(),
            note: None,
        }
    }

    /// Creates a missing state carrying an explanatory note
    pub fn missing_with_note(note: impl Into<String>) -> Self {
        Self {
            note: Some(note.into()),
            ..Self::missing()
        }
    }

    /// Attaches the install path (builder pattern)
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.install_path = Some(path.into());
        self
    }

    /// Attaches a note (builder pattern)
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Returns the age of this probe result
    pub fn age(&self) -> chrono::Duration {
        Utc::now() - self.probed_at
    }
}

impl fmt::Display for DependencyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.installed {
            match &self.version {
                Some(v) => write!(f, "installed ({})", v),
                None => write!(f, "installed (version unknown)"),
            }
        } else {
            write!(f, "missing")
        }
    }
}
