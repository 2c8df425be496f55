//! Git repository fixtures.

use std::fs;
use std::path::Path;
use std::process::Command;

/// Runs a `git` CLI command inside `path`, panicking on failure.
///
/// Fixture setup only — library code never shells out to git.
///
/// # Panics
/// Panics if the command cannot be spawned or exits non-zero.
pub fn run_git(path: &Path, args: &[&str]) {
    let output = Command::new("git")
        .args(args)
        .current_dir(path)
        .output()
        .unwrap_or_else(|e| panic!("run_git: failed to run `git {args:?}`: {e}"));
    if !output.status.success() {
        panic!(
            "run_git: `git {args:?}` failed:\n{}",
            String::from_utf8_lossy(&output.stderr)
        );
    }
}

/// Initialises a real git repository with an initial commit.
///
/// Realism level: **REAL WITH HISTORY** — valid git state, `master` branch,
/// one commit in history, commit identity configured.
///
/// # Panics
/// Panics if any git operation fails.
pub fn real_git_repo_with_commit(path: &Path) {
    run_git(path, &["init", "--initial-branch=master"]);
    run_git(path, &["config", "user.email", "test@test.com"]);
    run_git(path, &["config", "user.name", "Test User"]);
    run_git(path, &["config", "commit.gpgsign", "false"]);

    fs::write(path.join("README.md"), "# Test")
        .unwrap_or_else(|e| panic!("real_git_repo_with_commit: failed to write README.md: {e}"));

    run_git(path, &["add", "."]);
    run_git(path, &["commit", "-m", "Initial commit"]);
}

/// Stages everything and commits with the given message, returning the new
/// commit id.
///
/// # Panics
/// Panics if any git operation fails.
pub fn commit_all(path: &Path, message: &str) -> String {
    run_git(path, &["add", "-A"]);
    run_git(path, &["commit", "-m", message]);
    let output = Command::new("git")
        .args(["rev-parse", "HEAD"])
        .current_dir(path)
        .output()
        .unwrap_or_else(|e| panic!("commit_all: failed to run rev-parse: {e}"));
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// Creates a lightweight tag pointing at HEAD.
///
/// # Panics
/// Panics if the git operation fails.
pub fn tag_head(path: &Path, tag: &str) {
    run_git(path, &[&"tag"[..], tag]);
}
