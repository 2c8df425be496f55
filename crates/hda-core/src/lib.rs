//! Core registry and repository layer for the HDA manager.
//!
//! Tracks every version of each digital-asset definition across one or more
//! versioned package repositories, keeps an editable working area, and decides
//! which versions stay installed under the configured load depth.
//!
//! # Architecture
//!
//! `hda-core` sits below the git/release/CLI layers:
//!
//! ```text
//!        hda-cli
//!           |
//!     +-----+------+
//!     |            |
//! hda-release   hda-git
//!     |            |
//!     +-----+------+
//!           |
//!        hda-core
//! ```

pub mod config;
pub mod definition;
pub mod error;
pub mod ident;
pub mod manager;
pub mod package;
pub mod registry;
pub mod repo;
pub mod validate;
pub mod version;

pub use config::{ManagerConfig, PublishPolicy};
pub use definition::Definition;
pub use error::{Error, Result};
pub use ident::TypeName;
pub use manager::{AssetManager, PreparedRelease};
pub use package::PackageDetails;
pub use registry::{NodeType, NodeTypeVersion};
pub use repo::AssetRepo;
pub use validate::{CheckOutcome, PublishChecks};
pub use version::{Bump, VersionChoice, VersionKey};
