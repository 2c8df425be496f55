//! Error types for hda-core

use std::path::PathBuf;

/// Result type for hda-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in hda-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {format} config at {path}: {message}")]
    ConfigParse {
        path: PathBuf,
        format: String,
        message: String,
    },

    #[error("Failed to serialize {format} config for {path}: {message}")]
    ConfigSerialize {
        path: PathBuf,
        format: String,
        message: String,
    },

    #[error("Unsupported config format: {extension}")]
    UnsupportedFormat { extension: String },

    #[error("Invalid node type name: {name}")]
    InvalidTypeName { name: String },

    #[error("Invalid version string '{version}': {message}")]
    InvalidVersion { version: String, message: String },

    #[error("Asset directory could not be loaded: {path}")]
    AssetDirMissing { path: PathBuf },

    #[error("Invalid definition library at {path}: {message}")]
    InvalidLibrary { path: PathBuf, message: String },

    #[error("Invalid package manifest at {path}: {message}")]
    InvalidPackage { path: PathBuf, message: String },

    #[error("Node type {index} not found in {repo}")]
    NodeTypeNotFound { index: String, repo: String },

    #[error("No version found for library {path}")]
    VersionNotFound { path: PathBuf },

    #[error("No repository registered for namespace {namespace}")]
    NamespaceNotFound { namespace: String },

    #[error("No repository owns the library at {path}")]
    RepoNotFound { path: PathBuf },

    #[error("{namespace} is an invalid namespace. Should be one of: {available}")]
    InvalidNamespace {
        namespace: String,
        available: String,
    },

    #[error("Nothing to update for {path}")]
    NothingToUpdate { path: PathBuf },

    #[error("Publishing is locked for this session")]
    PublishLocked,

    #[error("Publishing is restricted to the show package, '{package}' is not it")]
    PublishRestricted { package: String },

    #[error("Publish checks failed:\n{report}")]
    ChecksFailed { report: String },
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn invalid_library(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::InvalidLibrary {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn invalid_package(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::InvalidPackage {
            path: path.into(),
            message: message.into(),
        }
    }
}
