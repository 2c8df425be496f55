//! Error types for hda-git

/// Result type for hda-git operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in hda-git operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("Branch '{name}' not found")]
    BranchNotFound { name: String },

    #[error("Remote '{name}' not found")]
    RemoteNotFound { name: String },

    #[error("Push failed: {message}")]
    PushFailed { message: String },

    #[error("Pull failed: {message}")]
    PullFailed { message: String },

    #[error("Cannot fast-forward: {message}")]
    CannotFastForward { message: String },

    #[error("Merge of '{branch}' resulted in conflicts")]
    MergeConflict { branch: String },

    #[error("No default branch found (tried: {tried})")]
    NoDefaultBranch { tried: String },

    #[error("No release commit recorded for package '{package}'")]
    NoReleaseCommit { package: String },
}
