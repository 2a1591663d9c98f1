//! Manifest discovery and declared-dependency extraction
//!
//! Scans a project root (top level only, no recursion into node_modules
//! or virtualenvs) for known manifest files, and parses the dependencies
//! they declare. Parse failures in individual files are logged and
//! skipped so one broken manifest never hides the others.

mod package_json;
mod python;

pub use package_json::parse_package_json;
pub use python::{parse_pyproject, parse_requirements};

use crate::domain::Ecosystem;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A dependency as declared in a manifest file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestDependency {
    /// Declared package name
    pub name: String,
    /// Raw version specifier, when one is declared
    pub version_spec: Option<String>,
    /// Whether this is a development-only dependency
    pub is_dev: bool,
    /// Which ecosystem declared it
    pub ecosystem: Ecosystem,
}

/// A manifest file found in the project root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestInfo {
    /// Absolute path to the manifest
    pub path: PathBuf,
    /// Ecosystem the manifest belongs to
    pub ecosystem: Ecosystem,
}

/// Finds known manifest files directly under the project root
///
/// Besides the canonical names this picks up requirements*.txt
/// variants such as requirements-dev.txt.
pub fn detect_manifests(root: &Path) -> Vec<ManifestInfo> {
    let mut manifests = Vec::new();
    for ecosystem in Ecosystem::all() {
        for filename in ecosystem.manifest_filenames() {
            let path = root.join(filename);
            if path.is_file() {
                manifests.push(ManifestInfo {
                    path,
                    ecosystem: *ecosystem,
                });
            }
        }
    }
    for path in requirements_variants(root) {
        if !manifests.iter().any(|m| m.path == path) {
            manifests.push(ManifestInfo {
                path,
                ecosystem: Ecosystem::Python,
            });
        }
    }
    manifests
}

/// Requirements files in the root, sorted for deterministic order
fn requirements_variants(root: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(root) else {
        return Vec::new();
    };
    let mut paths: Vec<PathBuf> = entries
        .flatten()
        .filter(|entry| {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            name.starts_with("requirements") && name.ends_with(".txt")
        })
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect();
    paths.sort();
    paths
}

/// Returns the ecosystems that have at least one manifest in the root
pub fn present_ecosystems(root: &Path) -> Vec<Ecosystem> {
    let manifests = detect_manifests(root);
    Ecosystem::all()
        .iter()
        .copied()
        .filter(|eco| manifests.iter().any(|m| m.ecosystem == *eco))
        .collect()
}

/// Parses every manifest in the root into declared dependencies
///
/// Duplicate names within one ecosystem keep the first occurrence.
pub fn discover_dependencies(root: &Path) -> Vec<ManifestDependency> {
    let mut deps: Vec<ManifestDependency> = Vec::new();
    for manifest in detect_manifests(root) {
        let parsed = parse_manifest(&manifest);
        match parsed {
            Ok(found) => {
                for dep in found {
                    let duplicate = deps
                        .iter()
                        .any(|d| d.name == dep.name && d.ecosystem == dep.ecosystem);
                    if !duplicate {
                        deps.push(dep);
                    }
                }
            }
            Err(e) => {
                debug!(path = %manifest.path.display(), error = %e, "skipping unparseable manifest");
            }
        }
    }
    deps
}

fn parse_manifest(manifest: &ManifestInfo) -> Result<Vec<ManifestDependency>, String> {
    let filename = manifest
        .path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("");
    match filename {
        "package.json" => parse_package_json(&manifest.path),
        "pyproject.toml" => parse_pyproject(&manifest.path),
        // Pipfile declares deps in TOML but pipenv resolution happens via
        // the lock; treat presence as ecosystem evidence only
        "Pipfile" => Ok(Vec::new()),
        name if name.starts_with("requirements") && name.ends_with(".txt") => {
            parse_requirements(&manifest.path)
        }
        other => Err(format!("no parser for {}", other)),
    }
}

/// Files worth snapshotting before a batch update
///
/// Manifests, lock files and any requirements*.txt variants present in
/// the root.
pub fn backup_targets(root: &Path) -> Vec<PathBuf> {
    let mut targets = Vec::new();
    for ecosystem in Ecosystem::all() {
        for filename in ecosystem
            .manifest_filenames()
            .iter()
            .chain(ecosystem.lock_filenames())
        {
            let path = root.join(filename);
            if path.is_file() && !targets.contains(&path) {
                targets.push(path);
            }
        }
    }
    // requirements-dev.txt and friends
    for path in requirements_variants(root) {
        if !targets.contains(&path) {
            targets.push(path);
        }
    }
    targets.sort();
    targets
}
