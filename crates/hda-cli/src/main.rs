//! HDA Manager CLI
//!
//! The command-line interface for managing versioned digital-asset
//! definitions across package repositories.

mod cli;
mod commands;
mod error;

use clap::Parser;
use colored::Colorize;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use cli::{Cli, Commands};
use error::Result;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    // Setup tracing if verbose
    if cli.verbose {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(Level::DEBUG)
            .with_target(true)
            .finish();
        tracing::subscriber::set_global_default(subscriber)
            .expect("Failed to set tracing subscriber");
        tracing::debug!("Verbose mode enabled");
    }

    let config = cli.config.as_deref();
    match cli.command {
        Some(cmd) => execute_command(cmd, config),
        None => {
            // No command provided - show help hint
            println!("{} HDA Manager CLI", "hdam".green().bold());
            println!();
            println!("Run {} for available commands.", "hdam --help".cyan());
            Ok(())
        }
    }
}

fn execute_command(cmd: Commands, config: Option<&std::path::Path>) -> Result<()> {
    let config = commands::load_config(config)?;
    match cmd {
        Commands::Status { json } => commands::run_status(config, json),
        Commands::List { namespace, all } => {
            commands::run_list(config, namespace.as_deref(), all)
        }
        Commands::Edit { library } => commands::run_edit(config, &library),
        Commands::Discard { library } => commands::run_discard(config, &library),
        Commands::Configure {
            library,
            namespace,
            name,
            bump,
        } => commands::run_configure(
            config,
            &library,
            namespace.as_deref(),
            name.as_deref(),
            bump.and_then(cli::BumpArg::to_bump),
        ),
        Commands::Publish {
            library,
            comment,
            dry_run,
        } => commands::run_publish(config, &library, &comment, dry_run),
        Commands::History { library, limit } => commands::run_history(config, &library, limit),
    }
}
