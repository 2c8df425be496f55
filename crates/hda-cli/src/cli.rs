//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use hda_core::Bump;

/// HDA Manager - manage versioned digital-asset definitions
#[derive(Parser, Debug)]
#[command(name = "hdam")]
#[command(author, version, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to the manager configuration file (TOML or JSON)
    #[arg(short, long, global = true, env = "HDAM_CONFIG")]
    pub config: Option<PathBuf>,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Show an overview of the loaded repositories
    Status {
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// List registered node types and their versions
    List {
        /// Only show types in this namespace
        #[arg(short, long)]
        namespace: Option<String>,

        /// Include versions that are indexed but not installed
        #[arg(short, long)]
        all: bool,
    },

    /// Check a library out into the editable working area
    ///
    /// Copies the library into the edit directory under a timestamped name
    /// and installs the copy, overriding the released version.
    Edit {
        /// Path to the library to edit
        library: PathBuf,
    },

    /// Discard an editable working copy
    ///
    /// Removes the working copy from the session and moves the library into
    /// the backup directory.
    Discard {
        /// Path to the working copy
        library: PathBuf,
    },

    /// Rename and/or re-version an editable working copy
    ///
    /// Examples:
    ///   hdam configure edit/Sop_x.hda --bump minor
    ///   hdam configure edit/Sop_x.hda --name scatter_v2
    ///   hdam configure edit/Sop_x.hda --namespace rebellion.show --bump major
    Configure {
        /// Path to the working copy
        library: PathBuf,

        /// New namespace
        #[arg(long)]
        namespace: Option<String>,

        /// New node type name
        #[arg(long)]
        name: Option<String>,

        /// Version bump against the latest registered version
        #[arg(short, long)]
        bump: Option<BumpArg>,
    },

    /// Release an editable working copy into its package
    Publish {
        /// Path to the working copy
        library: PathBuf,

        /// Release comment
        ///
        /// `-c` stays reserved for the global `--config` flag.
        #[arg(long)]
        comment: String,

        /// Run the publish checks and show the release plan without
        /// touching the source repository
        #[arg(long)]
        dry_run: bool,
    },

    /// Show the change history of a released asset
    History {
        /// Path to the released library
        library: PathBuf,

        /// Show at most this many entries, newest last
        #[arg(short, long)]
        limit: Option<usize>,
    },
}

/// Version bump selector
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BumpArg {
    Major,
    Minor,
    Patch,
    /// Keep the current version
    None,
}

impl BumpArg {
    pub fn to_bump(self) -> Option<Bump> {
        match self {
            Self::Major => Some(Bump::Major),
            Self::Minor => Some(Bump::Minor),
            Self::Patch => Some(Bump::Patch),
            Self::None => None,
        }
    }
}
