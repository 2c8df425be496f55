//! List command

use colored::Colorize;

use hda_core::{AssetManager, ManagerConfig, NodeType};

use crate::error::Result;

/// Run the list command
pub fn run_list(config: ManagerConfig, namespace: Option<&str>, all: bool) -> Result<()> {
    let manager = AssetManager::load(config)?;

    for repo in manager.repos() {
        let mut indices: Vec<&String> = repo
            .node_types()
            .iter()
            .filter(|(_, node_type)| {
                namespace.is_none_or(|ns| node_type.namespace() == ns)
            })
            .map(|(index, _)| index)
            .collect();
        if indices.is_empty() {
            continue;
        }
        indices.sort();

        println!("{}:", repo.name().cyan().bold());
        for index in indices {
            let node_type = &repo.node_types()[index];
            print_node_type(index, node_type, all);
        }
        println!();
    }
    Ok(())
}

fn print_node_type(index: &str, node_type: &NodeType, all: bool) {
    println!("  {}", index.bold());
    for (version, entries) in node_type.all_versions() {
        for entry in entries {
            let mut markers = Vec::new();
            if entry.is_installed() {
                markers.push("installed".green());
            } else if !all {
                continue;
            }
            if entry.is_hidden() {
                markers.push("hidden".yellow());
            }
            let markers = markers
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            if markers.is_empty() {
                println!("    {version}");
            } else {
                println!("    {version} ({markers})");
            }
        }
    }
}
