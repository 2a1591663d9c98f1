//! package.json parsing

use super::ManifestDependency;
use crate::domain::Ecosystem;
use std::path::Path;

/// Parses declared dependencies from a package.json file
pub fn parse_package_json(path: &Path) -> Result<Vec<ManifestDependency>, String> {
    let content = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
    let value: serde_json::Value = serde_json::from_str(&content).map_err(|e| e.to_string())?;

    let mut deps = Vec::new();
    collect_section(&value, "dependencies", false, &mut deps);
    collect_section(&value, "devDependencies", true, &mut deps);
    Ok(deps)
}

fn collect_section(
    value: &serde_json::Value,
    section: &str,
    is_dev: bool,
    out: &mut Vec<ManifestDependency>,
) {
    let Some(map) = value.get(section).and_then(|v| v.as_object()) else {
        return;
    };
    for (name, spec) in map {
        out.push(ManifestDependency {
            name: name.clone(),
            version_spec: spec.as_str().map(|s| s.to_string()),
            is_dev,
            ecosystem: Ecosystem::Node,
        });
    }
}
