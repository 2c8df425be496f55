//! The versioned node-type registry.
//!
//! Each [`NodeType`] records every known version of one digital asset,
//! keyed by [`VersionKey`] with one entry per backing library. Whether a
//! version is *installed* (active in the session) is decided at add time:
//! only the most recent `depth` versions are installed, unless forced.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use semver::Version;
use tracing::{debug, info};

use crate::version::VersionKey;
use crate::{Error, Result};

/// One concrete version of a node type: a backing library plus session state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeTypeVersion {
    path: PathBuf,
    installed: bool,
    hidden: bool,
}

impl NodeTypeVersion {
    /// The expanded library backing this version.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Is this version active in the session?
    pub fn is_installed(&self) -> bool {
        self.installed
    }

    /// Is this version hidden from the tab menu?
    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    /// Hide an installed version.
    pub fn hide(&mut self) {
        if self.installed {
            info!(path = %self.path.display(), "Hiding node type version");
            self.hidden = true;
        }
    }
}

/// All known versions of one node type.
#[derive(Debug, Clone)]
pub struct NodeType {
    namespace: String,
    name: String,
    versions: BTreeMap<VersionKey, Vec<NodeTypeVersion>>,
}

impl NodeType {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        let namespace = namespace.into();
        let name = name.into();
        info!(namespace = %namespace, name = %name, "Initialised node type");
        Self {
            namespace,
            name,
            versions: BTreeMap::new(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register a version backed by the given library.
    ///
    /// The version is installed when `force` is set (editable/explicit
    /// installs) or while fewer than `depth` distinct versions are known.
    /// Callers feed versions newest-first, so the newest `depth` end up
    /// installed and older ones stay indexed but uninstalled.
    pub fn add_version(&mut self, version: VersionKey, path: PathBuf, depth: usize, force: bool) {
        info!(
            version = %version,
            namespace = %self.namespace,
            name = %self.name,
            "Adding node type version"
        );
        let install = force || self.num_versions() < depth;
        let entry = NodeTypeVersion {
            path,
            installed: install,
            hidden: false,
        };
        self.versions.entry(version).or_default().push(entry);
    }

    /// Remove the entry for the given backing library under the given
    /// version. Uninstalls the library, moving it into `backup_dir` when one
    /// is provided. Errors when no entry matches.
    pub fn remove_version(
        &mut self,
        version: &VersionKey,
        path: &Path,
        backup_dir: Option<&Path>,
    ) -> Result<()> {
        let entries = self.versions.get_mut(version).ok_or_else(|| {
            Error::VersionNotFound {
                path: path.to_path_buf(),
            }
        })?;

        let index = entries
            .iter()
            .position(|entry| entry.path == path)
            .ok_or_else(|| Error::VersionNotFound {
                path: path.to_path_buf(),
            })?;
        entries.remove(index);
        if entries.is_empty() {
            self.versions.remove(version);
        }

        uninstall_library(path, backup_dir)?;
        debug!(version = %version, name = %self.name, "Removed node type version");
        Ok(())
    }

    /// Entries registered for one version.
    pub fn get_version(&self, version: &VersionKey) -> &[NodeTypeVersion] {
        match self.versions.get(version) {
            Some(entries) => entries,
            None => {
                debug!(version = %version, name = %self.name, "Version does not exist");
                &[]
            }
        }
    }

    /// Number of distinct versions known.
    pub fn num_versions(&self) -> usize {
        self.versions.len()
    }

    /// Every version, oldest first.
    pub fn all_versions(&self) -> impl Iterator<Item = (&VersionKey, &[NodeTypeVersion])> {
        self.versions.iter().map(|(k, v)| (k, v.as_slice()))
    }

    /// The highest known version key.
    pub fn max_version(&self) -> Option<&VersionKey> {
        self.versions.keys().next_back()
    }

    /// The highest known semantic version, ignoring the unversioned bucket.
    pub fn latest(&self) -> Option<&Version> {
        self.versions.keys().next_back().and_then(|k| k.as_version())
    }

    /// Versions with at least one installed entry.
    pub fn installed_versions(&self) -> BTreeMap<&VersionKey, Vec<&NodeTypeVersion>> {
        self.filter_versions(|entry| entry.installed)
    }

    /// Versions with at least one entry not installed.
    pub fn uninstalled_versions(&self) -> BTreeMap<&VersionKey, Vec<&NodeTypeVersion>> {
        self.filter_versions(|entry| !entry.installed)
    }

    fn filter_versions(
        &self,
        keep: impl Fn(&NodeTypeVersion) -> bool,
    ) -> BTreeMap<&VersionKey, Vec<&NodeTypeVersion>> {
        let mut result = BTreeMap::new();
        for (version, entries) in &self.versions {
            let kept: Vec<&NodeTypeVersion> = entries.iter().filter(|e| keep(e)).collect();
            if !kept.is_empty() {
                result.insert(version, kept);
            }
        }
        result
    }

    /// Hide every version of this node type.
    pub fn hide_all_versions(&mut self) {
        for entries in self.versions.values_mut() {
            for entry in entries {
                entry.hide();
            }
        }
    }
}

/// Uninstall a library from the session, moving it into the backup directory
/// when one is provided.
fn uninstall_library(path: &Path, backup_dir: Option<&Path>) -> Result<()> {
    let Some(backup_dir) = backup_dir else {
        return Ok(());
    };
    if !path.exists() {
        return Ok(());
    }
    fs::create_dir_all(backup_dir).map_err(|e| Error::io(backup_dir, e))?;
    let file_name = path
        .file_name()
        .ok_or_else(|| Error::invalid_library(path, "unreadable library name"))?;
    let target = backup_dir.join(file_name);
    if target.exists() {
        fs::remove_dir_all(&target).map_err(|e| Error::io(&target, e))?;
    }
    fs::rename(path, &target).map_err(|e| Error::io(path, e))?;
    debug!(
        library = %path.display(),
        backup = %backup_dir.display(),
        "Library backed up"
    );
    Ok(())
}
