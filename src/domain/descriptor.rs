//! Static dependency descriptors and the catalog that holds them

use super::{DependencyKind, Ecosystem};
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Static definition of a tracked dependency
///
/// Descriptors are immutable once loaded; probe results live in
/// [`super::DependencyState`], never here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyDescriptor {
    /// Display name of the dependency
    pub name: String,
    /// How the dependency is detected and installed
    pub kind: DependencyKind,
    /// Package universe this dependency belongs to
    pub ecosystem: Ecosystem,
    /// Package name in the package manager, when it differs from `name`
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub package_name: Option<String>,
    /// Required version constraint (e.g. ">=2.0.0")
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub required_version: Option<String>,
    /// Whether a missing installation should dominate the health score
    #[serde(default)]
    pub critical: bool,
    /// Command aliases to try when probing (defaults to the name)
    #[serde(default)]
    pub commands: Vec<String>,
}

impl DependencyDescriptor {
    /// Creates a new descriptor with the command list defaulting to the name
    pub fn new(name: impl Into<String>, kind: DependencyKind, ecosystem: Ecosystem) -> Self {
        let name = name.into();
        Self {
            commands: vec![name.clone()],
            name,
            kind,
            ecosystem,
            package_name: None,
            required_version: None,
            critical: false,
        }
    }

    /// Sets the command aliases (builder pattern)
    pub fn with_commands(mut self, commands: &[&str]) -> Self {
        self.commands = commands.iter().map(|c| (*c).to_string()).collect();
        self
    }

    /// Sets the package-manager package name (builder pattern)
    pub fn with_package_name(mut self, package_name: impl Into<String>) -> Self {
        self.package_name = Some(package_name.into());
        self
    }

    /// Sets the required version constraint (builder pattern)
    pub fn with_required_version(mut self, constraint: impl Into<String>) -> Self {
        self.required_version = Some(constraint.into());
        self
    }

    /// Marks this dependency as critical (builder pattern)
    pub fn critical(mut self) -> Self {
        self.critical = true;
        self
    }

    /// Returns the package name used by package-manager commands
    pub fn package(&self) -> &str {
        self.package_name.as_deref().unwrap_or(&self.name)
    }
}

impl fmt::Display for DependencyDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let crit = if self.critical { " (critical)" } else { "" };
        write!(f, "{} [{}]{}", self.name, self.kind, crit)
    }
}

/// The static dependency catalog
///
/// An explicit configuration object constructed once and passed by
/// reference; there is no process-wide table.
#[derive(Debug, Clone, Default)]
pub struct DependencyCatalog {
    descriptors: Vec<DependencyDescriptor>,
}

impl DependencyCatalog {
    /// Creates an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the built-in core catalog of tooling every project relies on
    pub fn core() -> Self {
        let mut catalog = Self::new();
        catalog.add(
            DependencyDescriptor::new("node", DependencyKind::Binary, Ecosystem::Node)
                .with_required_version(">=18.0.0")
                .critical(),
        );
        catalog.add(
            DependencyDescriptor::new("npm", DependencyKind::Binary, Ecosystem::Node)
                .with_required_version(">=9.0.0")
                .critical(),
        );
        catalog.add(
            DependencyDescriptor::new("python3", DependencyKind::Binary, Ecosystem::Python)
                .with_commands(&["python3", "python"])
                .with_required_version(">=3.9.0")
                .critical(),
        );
        catalog.add(
            DependencyDescriptor::new("pip", DependencyKind::Binary, Ecosystem::Python)
                .with_commands(&["pip3", "pip"])
                .critical(),
        );
        catalog.add(
            DependencyDescriptor::new("git", DependencyKind::Binary, Ecosystem::Node)
                .with_required_version(">=2.0.0")
                .critical(),
        );
        catalog
    }

    /// Adds a descriptor, replacing any existing entry with the same name
    pub fn add(&mut self, descriptor: DependencyDescriptor) {
        self.descriptors.retain(|d| d.name != descriptor.name);
        self.descriptors.push(descriptor);
    }

    /// Adds a descriptor only when no entry with the same name exists
    ///
    /// Used when merging dynamically discovered dependencies: the static
    /// catalog always wins.
    pub fn merge(&mut self, descriptor: DependencyDescriptor) -> bool {
        if self.get(&descriptor.name).is_some() {
            return false;
        }
        self.descriptors.push(descriptor);
        true
    }

    /// Looks up a descriptor by name
    pub fn get(&self, name: &str) -> Option<&DependencyDescriptor> {
        self.descriptors.iter().find(|d| d.name == name)
    }

    /// Returns an iterator over all descriptors
    pub fn iter(&self) -> impl Iterator<Item = &DependencyDescriptor> {
        self.descriptors.iter()
    }

    /// Returns all critical descriptors
    pub fn critical(&self) -> impl Iterator<Item = &DependencyDescriptor> {
        self.descriptors.iter().filter(|d| d.critical)
    }

    /// Returns the number of descriptors
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Returns true when the catalog has no entries
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Extends the catalog from a JSON file of descriptors, if it exists
    pub fn extend_from_file(&mut self, path: &Path) -> Result<usize, ConfigError> {
        if !path.exists() {
            return Ok(0);
        }
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let extra: Vec<DependencyDescriptor> =
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        let count = extra.len();
        for mut descriptor in extra {
            if descriptor.commands.is_empty() {
                descriptor.commands = vec![descriptor.name.clone()];
            }
            self.add(descriptor);
        }
        Ok(count)
    }
}
