//! Ecosystem and dependency kind definitions

use serde::{Deserialize, Serialize};
use std::fmt;

/// A managed package universe with its own manifest format and package manager
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ecosystem {
    /// Python ecosystem (pyproject.toml, requirements files, pip)
    Python,
    /// Node.js ecosystem (package.json, npm)
    Node,
}

impl Ecosystem {
    /// Returns the manifest filenames for this ecosystem
    pub fn manifest_filenames(&self) -> &'static [&'static str] {
        match self {
            Ecosystem::Python => &["pyproject.toml", "requirements.txt", "Pipfile"],
            Ecosystem::Node => &["package.json"],
        }
    }

    /// Returns the lock filenames for this ecosystem
    pub fn lock_filenames(&self) -> &'static [&'static str] {
        match self {
            Ecosystem::Python => &["Pipfile.lock", "poetry.lock", "uv.lock"],
            Ecosystem::Node => &["package-lock.json", "yarn.lock", "pnpm-lock.yaml"],
        }
    }

    /// Returns the display name for this ecosystem
    pub fn display_name(&self) -> &'static str {
        match self {
            Ecosystem::Python => "Python",
            Ecosystem::Node => "Node.js",
        }
    }

    /// Returns the audit tool used for security checks in this ecosystem
    pub fn audit_tool(&self) -> &'static str {
        match self {
            Ecosystem::Python => "pip-audit",
            Ecosystem::Node => "npm",
        }
    }

    /// Returns all supported ecosystems
    pub fn all() -> &'static [Ecosystem] {
        &[Ecosystem::Python, Ecosystem::Node]
    }
}

impl fmt::Display for Ecosystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// How a dependency is detected and installed
///
/// Each kind selects one probe variant and one installation strategy;
/// a descriptor maps to exactly one kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyKind {
    /// System binary found on PATH (no automated install)
    Binary,
    /// Library package of a language (e.g. a pip-installed package)
    LanguagePackage,
    /// Globally installed package-manager entry (e.g. npm -g)
    PackageManagerGlobal,
    /// Project-local package-manager entry (e.g. npm in the project tree)
    PackageManagerLocal,
    /// Tool with command aliases that may also live in a global package manager
    SpecializedTool,
}

impl DependencyKind {
    /// Returns the display name for this kind
    pub fn display_name(&self) -> &'static str {
        match self {
            DependencyKind::Binary => "binary",
            DependencyKind::LanguagePackage => "language package",
            DependencyKind::PackageManagerGlobal => "global package",
            DependencyKind::PackageManagerLocal => "local package",
            DependencyKind::SpecializedTool => "specialized tool",
        }
    }

    /// Returns all dependency kinds
    pub fn all() -> &'static [DependencyKind] {
        &[
            DependencyKind::Binary,
            DependencyKind::LanguagePackage,
            DependencyKind::PackageManagerGlobal,
            DependencyKind::PackageManagerLocal,
            DependencyKind::SpecializedTool,
        ]
    }
}

impl fmt::Display for DependencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}
