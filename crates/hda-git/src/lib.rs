//! Git plumbing for the HDA manager.
//!
//! Wraps the handful of libgit2 operations the release workflow and the
//! changelog miner need behind one repository type. Library code never
//! shells out to the `git` CLI.

pub mod changelog;
pub mod error;
pub mod repo;

pub use changelog::{HistoryRecord, PackageRelease};
pub use error::{Error, Result};
pub use repo::{GitRepo, TagInfo};
