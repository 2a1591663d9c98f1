//! Python manifest parsing (requirements files and pyproject.toml)

use super::ManifestDependency;
use crate::domain::Ecosystem;
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

static REQUIREMENT_NAME: OnceLock<Regex> = OnceLock::new();

fn requirement_name() -> &'static Regex {
    REQUIREMENT_NAME.get_or_init(|| {
        Regex::new(r"^([A-Za-z0-9][A-Za-z0-9._-]*)").expect("requirement pattern is valid")
    })
}

/// Parses a pip requirements file
///
/// Comments, includes (-r/-c), options (-e, --hash) and empty lines are
/// skipped. Environment markers and extras are dropped from the name.
pub fn parse_requirements(path: &Path) -> Result<Vec<ManifestDependency>, String> {
    let content = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
    let is_dev = path
        .file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.contains("dev") || n.contains("test"))
        .unwrap_or(false);

    let mut deps = Vec::new();
    for raw in content.lines() {
        let line = raw.split('#').next().unwrap_or("").trim();
        if line.is_empty() || line.starts_with('-') {
            continue;
        }
        let Some(captures) = requirement_name().captures(line) else {
            continue;
        };
        let name = captures[1].to_string();
        let mut rest = line[name.len()..].trim();
        // Drop an extras group such as "[security]"
        if rest.starts_with('[') {
            rest = rest.split_once(']').map(|(_, tail)| tail).unwrap_or("");
        }
        let spec = rest.split(';').next().unwrap_or("").trim();
        deps.push(ManifestDependency {
            name,
            version_spec: if spec.is_empty() {
                None
            } else {
                Some(spec.to_string())
            },
            is_dev,
            ecosystem: Ecosystem::Python,
        });
    }
    Ok(deps)
}

/// Parses declared dependencies from pyproject.toml
///
/// Reads `project.dependencies` plus `project.optional-dependencies`;
/// optional groups named dev/test/lint are flagged as dev dependencies.
pub fn parse_pyproject(path: &Path) -> Result<Vec<ManifestDependency>, String> {
    let content = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
    let value: toml::Value = toml::from_str(&content).map_err(|e| e.to_string())?;

    let mut deps = Vec::new();
    let Some(project) = value.get("project") else {
        return Ok(deps);
    };

    if let Some(list) = project.get("dependencies").and_then(|d| d.as_array()) {
        collect_pep508(list, false, &mut deps);
    }

    if let Some(groups) = project
        .get("optional-dependencies")
        .and_then(|d| d.as_table())
    {
        for (group, list) in groups {
            let is_dev = ["dev", "test", "tests", "lint", "docs"]
                .iter()
                .any(|g| group.contains(g));
            if let Some(list) = list.as_array() {
                collect_pep508(list, is_dev, &mut deps);
            }
        }
    }
    Ok(deps)
}

fn collect_pep508(list: &[toml::Value], is_dev: bool, out: &mut Vec<ManifestDependency>) {
    for entry in list {
        let Some(requirement) = entry.as_str() else {
            continue;
        };
        let Some(captures) = requirement_name().captures(requirement.trim()) else {
            continue;
        };
        let name = captures[1].to_string();
        let spec = requirement[name.len()..]
            .split(';')
            .next()
            .unwrap_or("")
            .trim();
        out.push(ManifestDependency {
            name,
            version_spec: if spec.is_empty() {
                None
            } else {
                Some(spec.to_string())
            },
            is_dev,
            ecosystem: Ecosystem::Python,
        });
    }
}
