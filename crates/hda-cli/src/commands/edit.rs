//! Working-copy commands: edit, discard, configure

use std::path::Path;

use colored::Colorize;

use hda_core::version::version_choices;
use hda_core::{AssetManager, Bump, ManagerConfig, definition};

use crate::error::Result;

/// Run the edit command
pub fn run_edit(config: ManagerConfig, library: &Path) -> Result<()> {
    let mut manager = AssetManager::load(config)?;
    let copy = manager.edit_definition(library)?;
    println!(
        "{} {} is now editable at {}",
        "ok:".green().bold(),
        copy.type_name(),
        copy.library_path().display()
    );
    Ok(())
}

/// Run the discard command
pub fn run_discard(config: ManagerConfig, library: &Path) -> Result<()> {
    let mut manager = AssetManager::load(config)?;
    manager.discard_definition(library)?;
    println!(
        "{} discarded {}",
        "ok:".green().bold(),
        library.display()
    );
    Ok(())
}

/// Run the configure command
///
/// Without any flag the command shows the version selector for the working
/// copy's type instead of changing anything.
pub fn run_configure(
    config: ManagerConfig,
    library: &Path,
    namespace: Option<&str>,
    name: Option<&str>,
    bump: Option<Bump>,
) -> Result<()> {
    let mut manager = AssetManager::load(config)?;
    if namespace.is_none() && name.is_none() && bump.is_none() {
        return show_version_choices(&manager, library);
    }
    let copy = manager.configure_definition(library, namespace, name, bump)?;
    println!(
        "{} configured as {} at {}",
        "ok:".green().bold(),
        copy.type_name(),
        copy.library_path().display()
    );
    Ok(())
}

fn show_version_choices(manager: &AssetManager, library: &Path) -> Result<()> {
    let def = definition::single_definition(library)?;
    let current = manager.current_node_type_version(
        def.category(),
        def.type_name().namespace().unwrap_or_default(),
        def.type_name().name(),
    );
    println!("Version choices for {}:", def.type_name().as_str().bold());
    for choice in version_choices(current.as_ref()) {
        println!("  {}", choice.label());
    }
    println!("Apply one with --bump, or rename with --name / --namespace.");
    Ok(())
}
