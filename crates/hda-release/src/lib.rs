//! Release workflow for the HDA manager.
//!
//! Takes a prepared release from `hda-core` and ships it: clones the asset
//! source repository, cuts a release branch, swaps in the working copy, bumps
//! the package version, runs the external build, verifies the installed
//! result, and merges the branch back to trunk.

pub mod build;
pub mod error;
pub mod workflow;

pub use build::{BuildOutput, run_build};
pub use error::{Error, Result};
pub use workflow::{ReleaseJob, ReleasedAsset};
