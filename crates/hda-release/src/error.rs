//! Error types for hda-release

use std::path::PathBuf;

/// Result type for hda-release operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while running a release
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error at '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Core(#[from] hda_core::Error),

    #[error(transparent)]
    Git(#[from] hda_git::Error),

    #[error("Could not launch build command '{command}': {source}")]
    BuildLaunch {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Build command '{command}' failed with {status}:\n{stdout}\n{stderr}")]
    BuildFailed {
        command: String,
        status: String,
        stdout: String,
        stderr: String,
    },

    #[error("Build reported success but released package '{path}' does not exist")]
    ReleaseMissing { path: PathBuf },
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
