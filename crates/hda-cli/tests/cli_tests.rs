//! Integration tests for the hdam CLI binary.
//!
//! These tests exercise the actual compiled binary using assert_cmd.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{TempDir, tempdir};

use hda_test_utils::package::PackageTree;

/// Get a Command for the hdam binary
fn hdam_cmd() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("hdam"));
    cmd.env_remove("HDAM_CONFIG").env_remove("HDAM_PUBLISH");
    cmd
}

/// A packages root with one released package version and a matching
/// config file. Returns the temp dir and the config path.
fn seeded_session() -> (TempDir, PathBuf) {
    let dir = tempdir().unwrap();
    let packages_root = dir.path().join("packages");
    let tree = PackageTree::new(&packages_root, "houdini_hdas_pipeline");
    tree.add_version(
        "1.0.0",
        None,
        &[("Sop", "rebellion.pipeline::scatter::1.0.0")],
    );

    let config_path = dir.path().join("config.toml");
    write_config(&config_path, dir.path(), &[tree.version_dir("1.0.0")]);
    (dir, config_path)
}

fn write_config(config_path: &Path, root: &Path, repositories: &[PathBuf]) {
    let repos = repositories
        .iter()
        .map(|p| format!("{:?}", p.display().to_string()))
        .collect::<Vec<_>>()
        .join(", ");
    fs::write(
        config_path,
        format!(
            "packages_root = {:?}\nasset_repo = {:?}\nedit_dir = {:?}\nrepositories = [{repos}]\n",
            root.join("packages").display().to_string(),
            root.join("assets.git").display().to_string(),
            root.join("edit").display().to_string(),
        ),
    )
    .unwrap();
}

// ============================================================================
// Help and Version Tests
// ============================================================================

#[test]
fn test_help_output() {
    let mut cmd = hdam_cmd();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "HDA Manager - manage versioned digital-asset definitions",
        ));
}

#[test]
fn test_version_output() {
    let mut cmd = hdam_cmd();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("hdam"));
}

#[test]
fn test_no_command_shows_help_hint() {
    let mut cmd = hdam_cmd();
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("hdam --help"));
}

// ============================================================================
// Configuration Tests
// ============================================================================

#[test]
fn test_missing_config_errors() {
    let mut cmd = hdam_cmd();
    cmd.arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no configuration file"));
}

#[test]
fn test_unknown_config_key_errors() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("config.toml");
    fs::write(&config, "bogus = true\n").unwrap();

    let mut cmd = hdam_cmd();
    cmd.args(["--config", config.to_str().unwrap(), "status"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

// ============================================================================
// Status and List Tests
// ============================================================================

#[test]
fn test_status_lists_repositories() {
    let (_dir, config) = seeded_session();
    let mut cmd = hdam_cmd();
    cmd.args(["--config", config.to_str().unwrap(), "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("houdini_hdas_pipeline"))
        .stdout(predicate::str::contains("rebellion.pipeline"));
}

#[test]
fn test_status_json_output() {
    let (_dir, config) = seeded_session();
    let mut cmd = hdam_cmd();
    let output = cmd
        .args(["--config", config.to_str().unwrap(), "status", "--json"])
        .assert()
        .success();
    let stdout = String::from_utf8_lossy(&output.get_output().stdout).to_string();
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed["publishing"], true);
    assert!(parsed["repositories"].as_array().unwrap().len() >= 2);
}

#[test]
fn test_list_shows_registered_types() {
    let (_dir, config) = seeded_session();
    let mut cmd = hdam_cmd();
    cmd.args(["--config", config.to_str().unwrap(), "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("rebellion.pipeline::Sop/scatter"))
        .stdout(predicate::str::contains("1.0.0"));
}

#[test]
fn test_list_namespace_filter_excludes_others() {
    let (_dir, config) = seeded_session();
    let mut cmd = hdam_cmd();
    cmd.args([
        "--config",
        config.to_str().unwrap(),
        "list",
        "--namespace",
        "rebellion.other",
    ])
    .assert()
    .success()
    .stdout(predicate::str::contains("scatter").not());
}

// ============================================================================
// Edit Workflow Tests
// ============================================================================

#[test]
fn test_edit_creates_working_copy() {
    let (dir, config) = seeded_session();
    let library = dir
        .path()
        .join("packages/houdini_hdas_pipeline/1.0.0/hda/Sop_rebellion.pipeline_scatter.hda");

    let mut cmd = hdam_cmd();
    cmd.args([
        "--config",
        config.to_str().unwrap(),
        "edit",
        library.to_str().unwrap(),
    ])
    .assert()
    .success()
    .stdout(predicate::str::contains("editable"));

    let copies: Vec<_> = fs::read_dir(dir.path().join("edit"))
        .unwrap()
        .filter_map(|e| e.ok())
        .collect();
    assert_eq!(copies.len(), 1);
}

#[test]
fn test_discard_rejects_released_library() {
    let (dir, config) = seeded_session();
    let library = dir
        .path()
        .join("packages/houdini_hdas_pipeline/1.0.0/hda/Sop_rebellion.pipeline_scatter.hda");

    let mut cmd = hdam_cmd();
    cmd.args([
        "--config",
        config.to_str().unwrap(),
        "discard",
        library.to_str().unwrap(),
    ])
    .assert()
    .failure()
    .stderr(predicate::str::contains("error"));
}

#[test]
fn test_configure_without_flags_shows_version_choices() {
    let (dir, config) = seeded_session();
    let library = dir
        .path()
        .join("packages/houdini_hdas_pipeline/1.0.0/hda/Sop_rebellion.pipeline_scatter.hda");

    let mut edit = hdam_cmd();
    edit.args([
        "--config",
        config.to_str().unwrap(),
        "edit",
        library.to_str().unwrap(),
    ])
    .assert()
    .success();
    let copy = fs::read_dir(dir.path().join("edit"))
        .unwrap()
        .filter_map(|e| e.ok())
        .next()
        .unwrap()
        .path();

    let mut cmd = hdam_cmd();
    cmd.args([
        "--config",
        config.to_str().unwrap(),
        "configure",
        copy.to_str().unwrap(),
    ])
    .assert()
    .success()
    .stdout(predicate::str::contains("No change (1.0.0)"))
    .stdout(predicate::str::contains("Increment Minor (1.1.0)"));
}

#[test]
fn test_publish_respects_the_lock() {
    let (dir, config) = seeded_session();
    let library = dir
        .path()
        .join("packages/houdini_hdas_pipeline/1.0.0/hda/Sop_rebellion.pipeline_scatter.hda");

    // Make a working copy first.
    let mut edit = hdam_cmd();
    edit.args([
        "--config",
        config.to_str().unwrap(),
        "edit",
        library.to_str().unwrap(),
    ])
    .assert()
    .success();
    let copy = fs::read_dir(dir.path().join("edit"))
        .unwrap()
        .filter_map(|e| e.ok())
        .next()
        .unwrap()
        .path();

    let mut cmd = hdam_cmd();
    cmd.env("HDAM_PUBLISH", "lock")
        .args([
            "--config",
            config.to_str().unwrap(),
            "publish",
            copy.to_str().unwrap(),
            "--comment",
            "Fixes",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("locked"));
}
