//! The release workflow.
//!
//! Consumes a [`PreparedRelease`] and drives the asset from the working area
//! into a released package version: clone, release branch, asset replacement,
//! version bump, build, verification, and the merge back to trunk. Every
//! stage happens in a scratch checkout under the release directory, so an
//! aborted release leaves the session untouched.

use std::fs;
use std::path::{Path, PathBuf};

use semver::Version;
use tracing::{info, warn};

use hda_core::repo::ASSET_SUBDIRECTORY;
use hda_core::{Bump, ManagerConfig, PreparedRelease, package::bump_package_version};
use hda_git::GitRepo;

use crate::build::run_build;
use crate::{Error, Result};

const PACKAGE_FILE: &str = "package.py";
const VERSION_UP_MESSAGE: &str = "Version up";

/// Where a finished release landed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleasedAsset {
    /// Package version the asset shipped in.
    pub package_version: Version,
    /// Path of the released library inside the installed package.
    pub library_path: PathBuf,
}

/// One release run.
pub struct ReleaseJob<'a> {
    config: &'a ManagerConfig,
    prepared: PreparedRelease,
}

impl<'a> ReleaseJob<'a> {
    pub fn new(config: &'a ManagerConfig, prepared: PreparedRelease) -> Self {
        Self { config, prepared }
    }

    /// Run the release end to end.
    ///
    /// Returns `Ok(None)` when the working copy matches the released asset
    /// and there is nothing to ship. On success the scratch checkout is
    /// removed and the released library path is returned.
    pub fn run(self) -> Result<Option<ReleasedAsset>> {
        let prepared = &self.prepared;
        info!(
            node_type = prepared.node_type_name.as_str(),
            branch = prepared.branch,
            "Starting release"
        );

        let checkout = prepared.release_dir.join("git");
        let repo = GitRepo::clone(&self.config.asset_repo, &checkout)?;
        repo.create_branch(&prepared.branch)?;

        self.replace_asset(&checkout)?;

        if !repo.has_changes()? {
            warn!(
                node_type = prepared.node_type_name.as_str(),
                "Released asset already matches the working copy, nothing to release"
            );
            self.cleanup()?;
            return Ok(None);
        }

        repo.commit_all(&prepared.comment)?;
        repo.push(&prepared.branch)?;

        let package_dir = checkout.join(&prepared.package);
        let new_version = bump_package_version(&package_dir.join(PACKAGE_FILE), Bump::Minor)?;
        let manifest = Path::new(&prepared.package).join(PACKAGE_FILE);
        repo.commit_path(&manifest, VERSION_UP_MESSAGE)?;
        repo.push(&prepared.branch)?;

        run_build(
            &self.config.build_command,
            &package_dir,
            &self.config.build_env,
        )?;
        let library_path = self.verify_release(&new_version)?;

        let trunk = repo.default_branch()?;
        repo.checkout_branch(&trunk)?;
        repo.pull(&trunk)?;
        repo.merge_no_ff(&prepared.branch)?;
        repo.push(&trunk)?;

        self.cleanup()?;
        info!(
            version = %new_version,
            path = %library_path.display(),
            "Release complete"
        );
        Ok(Some(ReleasedAsset {
            package_version: new_version,
            library_path,
        }))
    }

    /// Swap the checkout's copy of the asset for the expanded working copy.
    /// The asset repository holds one directory per package, so the copy
    /// lands under `<package>/hda/`.
    fn replace_asset(&self, checkout: &Path) -> Result<()> {
        let source = self.prepared.release_dir.join(&self.prepared.asset_name);
        let target = checkout
            .join(&self.prepared.package)
            .join(ASSET_SUBDIRECTORY)
            .join(&self.prepared.asset_name);
        if target.exists() {
            fs::remove_dir_all(&target).map_err(|e| Error::io(&target, e))?;
        }
        copy_dir_recursive(&source, &target)?;
        Ok(())
    }

    /// The build must have produced the released package version with the
    /// asset inside it. A build that exits zero without installing anything
    /// is still a failed release.
    fn verify_release(&self, version: &Version) -> Result<PathBuf> {
        let released = self
            .config
            .packages_root
            .join(&self.prepared.package)
            .join(version.to_string());
        let library_path = released
            .join(ASSET_SUBDIRECTORY)
            .join(&self.prepared.asset_name);
        if !library_path.exists() {
            return Err(Error::ReleaseMissing { path: library_path });
        }
        Ok(library_path)
    }

    fn cleanup(&self) -> Result<()> {
        fs::remove_dir_all(&self.prepared.release_dir)
            .map_err(|e| Error::io(&self.prepared.release_dir, e))?;
        Ok(())
    }
}

fn copy_dir_recursive(source: &Path, target: &Path) -> Result<()> {
    fs::create_dir_all(target).map_err(|e| Error::io(target, e))?;
    for entry in fs::read_dir(source).map_err(|e| Error::io(source, e))? {
        let entry = entry.map_err(|e| Error::io(source, e))?;
        let from = entry.path();
        let to = target.join(entry.file_name());
        if from.is_dir() {
            copy_dir_recursive(&from, &to)?;
        } else {
            fs::copy(&from, &to).map_err(|e| Error::io(&from, e))?;
        }
    }
    Ok(())
}
