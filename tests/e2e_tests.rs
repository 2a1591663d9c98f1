//! End-to-end tests for the depsentry CLI
//!
//! These tests verify:
//! - Help output lists every subcommand
//! - Backup commands behave on empty and populated projects
//! - Exit codes for failure scenarios

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn depsentry() -> Command {
    Command::cargo_bin("depsentry").expect("binary builds")
}

#[test]
fn test_help_lists_subcommands() {
    depsentry()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("check"))
        .stdout(predicate::str::contains("outdated"))
        .stdout(predicate::str::contains("update"))
        .stdout(predicate::str::contains("report"))
        .stdout(predicate::str::contains("backup"))
        .stdout(predicate::str::contains("restore"));
}

#[test]
fn test_version_flag() {
    depsentry()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("depsentry"));
}

#[test]
fn test_backups_on_empty_project() {
    let temp_dir = TempDir::new().unwrap();
    depsentry()
        .args(["-C"])
        .arg(temp_dir.path())
        .arg("backups")
        .assert()
        .success()
        .stdout(predicate::str::contains("No backups"));
}

#[test]
fn test_backup_then_list_then_restore() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(
        temp_dir.path().join("package.json"),
        r#"{"dependencies": {"lodash": "^4.17.21"}}"#,
    )
    .unwrap();

    depsentry()
        .args(["-C"])
        .arg(temp_dir.path())
        .arg("backup")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created backup backup_"));

    let list = depsentry()
        .args(["-C"])
        .arg(temp_dir.path())
        .arg("backups")
        .assert()
        .success();
    let stdout = String::from_utf8(list.get_output().stdout.clone()).unwrap();
    let id = stdout
        .split_whitespace()
        .find(|w| w.starts_with("backup_"))
        .expect("backup id in listing")
        .to_string();

    fs::write(temp_dir.path().join("package.json"), "{}").unwrap();
    depsentry()
        .args(["-C"])
        .arg(temp_dir.path())
        .args(["restore", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains("Restored 1 file(s)"));

    let restored = fs::read_to_string(temp_dir.path().join("package.json")).unwrap();
    assert!(restored.contains("lodash"));
}

#[test]
fn test_restore_unknown_id_fails() {
    let temp_dir = TempDir::new().unwrap();
    depsentry()
        .args(["-C"])
        .arg(temp_dir.path())
        .args(["restore", "backup_19700101_000000"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_update_dry_run_on_empty_project() {
    // No manifests means no candidates, so nothing runs and nothing fails
    let temp_dir = TempDir::new().unwrap();
    depsentry()
        .args(["-C"])
        .arg(temp_dir.path())
        .args(["update", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0 updated, 0 failed"));
}

#[test]
fn test_outdated_json_on_empty_project() {
    let temp_dir = TempDir::new().unwrap();
    let output = depsentry()
        .args(["-C"])
        .arg(temp_dir.path())
        .args(["outdated", "--json"])
        .assert()
        .success();
    let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert!(value.as_array().unwrap().is_empty());
}
