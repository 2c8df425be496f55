//! Status command

use colored::Colorize;
use serde_json::json;

use hda_core::{AssetManager, ManagerConfig, PublishPolicy};

use crate::error::Result;

/// Run the status command
pub fn run_status(config: ManagerConfig, json: bool) -> Result<()> {
    let manager = AssetManager::load(config)?;

    if json {
        return print_json(&manager);
    }

    println!("{}", "HDA Manager".bold());
    println!();

    let policy = match manager.policy() {
        PublishPolicy::Unlocked => "unlocked".green(),
        PublishPolicy::Locked => "locked".red(),
        PublishPolicy::ShowOnly => "show only".yellow(),
    };
    println!("Publishing: {policy}");
    println!();

    for repo in manager.repos() {
        let label = if repo.is_editable() {
            format!("{} (editable)", repo.name())
        } else {
            match repo.package() {
                Some(package) => format!("{} {}", repo.name(), package.version),
                None => repo.name().to_string(),
            }
        };
        println!("{}:", label.cyan().bold());
        println!("  path:  {}", repo.repo_path().display());
        println!("  types: {}", repo.node_types().len());
    }

    println!();
    let namespaces = manager.all_available_namespaces();
    println!("Namespaces: {}", namespaces.join(", "));
    Ok(())
}

fn print_json(manager: &AssetManager) -> Result<()> {
    let repos: Vec<_> = manager
        .repos()
        .iter()
        .map(|repo| {
            json!({
                "name": repo.name(),
                "path": repo.repo_path(),
                "editable": repo.is_editable(),
                "version": repo.package().map(|p| p.version.to_string()),
                "node_types": repo.node_types().len(),
            })
        })
        .collect();
    let output = json!({
        "publishing": manager.policy().allows_publish(),
        "repositories": repos,
        "namespaces": manager.all_available_namespaces(),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
