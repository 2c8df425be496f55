//! History command

use std::path::Path;

use colored::Colorize;

use hda_core::{AssetManager, ManagerConfig};
use hda_git::changelog;

use crate::error::{CliError, Result};

/// Run the history command
pub fn run_history(config: ManagerConfig, library: &Path, limit: Option<usize>) -> Result<()> {
    let history_dir = config.history_dir();
    let source = config.asset_repo.clone();
    let manager = AssetManager::load(config)?;

    let repo = manager.repo_from_library(library)?;
    let package = repo.package().ok_or_else(|| {
        CliError::user(format!(
            "repository '{}' has no package manifest, cannot mine history",
            repo.name()
        ))
    })?;
    let asset_name = library
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| CliError::user("library path has no file name"))?;

    std::fs::create_dir_all(&history_dir)?;
    let records = changelog::mine_history(
        &source,
        &history_dir,
        &package.name,
        package.commit.as_deref(),
        asset_name,
    )?;

    let skip = limit.map_or(0, |n| records.len().saturating_sub(n));
    for record in records.iter().skip(skip) {
        let version = record.node_version.as_deref().unwrap_or("-");
        let release = record.package_version.as_deref().unwrap_or("unreleased");
        println!(
            "{} {} {} [{}] {}",
            record.date.format("%Y-%m-%d").to_string().dimmed(),
            version.bold(),
            record.author.cyan(),
            release,
            record.comment
        );
        if !record.python_diff.is_empty() {
            for line in record.python_diff.lines() {
                println!("    {line}");
            }
        }
    }
    Ok(())
}
