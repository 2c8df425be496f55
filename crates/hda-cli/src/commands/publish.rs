//! Publish command

use std::path::Path;

use colored::Colorize;
use tracing::info;

use hda_core::{AssetManager, ManagerConfig};
use hda_release::ReleaseJob;

use crate::error::Result;

/// Run the publish command
pub fn run_publish(
    config: ManagerConfig,
    library: &Path,
    comment: &str,
    dry_run: bool,
) -> Result<()> {
    let manager = AssetManager::load(config)?;
    let prepared = manager.prepare_publish(library, comment)?;

    println!("{}", "Release plan".bold());
    println!("  node type: {}", prepared.node_type_name);
    println!("  package:   {}", prepared.package);
    println!("  branch:    {}", prepared.branch);
    println!("  comment:   {}", prepared.comment);

    if dry_run {
        // The scratch directory was staged by prepare_publish; a dry run
        // must not leave it behind.
        std::fs::remove_dir_all(&prepared.release_dir)?;
        println!();
        println!("{} dry run, nothing released", "ok:".green().bold());
        return Ok(());
    }

    info!(branch = prepared.branch, "Releasing");
    match ReleaseJob::new(manager.config(), prepared).run()? {
        Some(released) => {
            println!();
            println!(
                "{} released {} at {}",
                "ok:".green().bold(),
                released.package_version,
                released.library_path.display()
            );
        }
        None => {
            println!();
            println!(
                "{} released asset already matches the working copy",
                "warning:".yellow().bold()
            );
        }
    }
    Ok(())
}
