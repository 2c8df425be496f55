//! Asset repositories.
//!
//! An [`AssetRepo`] wraps either one installed package version directory
//! (holding `package.py` and an `hda/` asset directory, with sibling version
//! directories under the same package root) or the editable working area.
//! Loading walks the version directories newest-first and populates the
//! node-type registry under the configured load depth.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use semver::Version;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::config::ManagerConfig;
use crate::definition::{self, Definition};
use crate::package::PackageDetails;
use crate::registry::NodeType;
use crate::version::{self, VersionKey};
use crate::{Error, Result};

/// Subdirectory of a package version that holds the expanded libraries.
pub const ASSET_SUBDIRECTORY: &str = "hda";

/// File listing node types hidden from the tab menu.
pub const OPHIDE_FILE: &str = "ophide.json";

/// Extension of expanded library directories.
const LIBRARY_EXTENSION: &str = "hda";

#[derive(Debug, Deserialize)]
struct OphideList {
    hide_list: Option<Vec<String>>,
}

/// One asset repository and its registered node types.
#[derive(Debug)]
pub struct AssetRepo {
    repo_path: PathBuf,
    editable: bool,
    package: Option<PackageDetails>,
    node_types: HashMap<String, NodeType>,
}

impl AssetRepo {
    /// Open a repository. Non-editable repositories read their `package.py`
    /// immediately; the editable working area has no package metadata.
    pub fn open(repo_path: impl Into<PathBuf>, editable: bool) -> Result<Self> {
        let repo_path = repo_path.into();
        let package = if editable {
            None
        } else {
            Some(PackageDetails::load(&repo_path.join("package.py"))?)
        };

        info!(
            name = package.as_ref().map(|p| p.name.as_str()).unwrap_or("editable"),
            path = %repo_path.display(),
            "Initialised asset repo"
        );
        Ok(Self {
            repo_path,
            editable,
            package,
            node_types: HashMap::new(),
        })
    }

    /// Is this the editable working area?
    pub fn is_editable(&self) -> bool {
        self.editable
    }

    /// The repository name: the package name, or `editable`.
    pub fn name(&self) -> &str {
        match &self.package {
            Some(package) => &package.name,
            None => "editable",
        }
    }

    /// Package metadata, absent for the editable repo.
    pub fn package(&self) -> Option<&PackageDetails> {
        self.package.as_ref()
    }

    /// The path this repo was opened at (a version dir, or the edit dir).
    pub fn repo_path(&self) -> &Path {
        &self.repo_path
    }

    /// The asset directory of this repository version.
    pub fn asset_directory(&self) -> PathBuf {
        self.repo_path.join(ASSET_SUBDIRECTORY)
    }

    /// The package root: the directory holding all version directories.
    /// For the editable repo this is the repo path itself.
    pub fn repo_root(&self) -> PathBuf {
        if self.editable {
            self.repo_path.clone()
        } else {
            self.repo_path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| self.repo_path.clone())
        }
    }

    /// Registered node types, keyed by `namespace::category/name`.
    pub fn node_types(&self) -> &HashMap<String, NodeType> {
        &self.node_types
    }

    pub fn node_type(&self, index: &str) -> Option<&NodeType> {
        self.node_types.get(index)
    }

    /// Namespaces this repository can publish into, inferred from the
    /// package name. The editable repo offers none.
    pub fn available_namespaces(&self, config: &ManagerConfig) -> Vec<String> {
        let Some(package) = &self.package else {
            return Vec::new();
        };
        config
            .namespace_from_package(&package.name)
            .into_iter()
            .collect()
    }

    /// Load every definition this repository provides.
    ///
    /// The editable repo scans its root directly. Package repos walk their
    /// version directories, and additionally the released package tree when
    /// the repo root lives outside the main packages root.
    pub fn load(&mut self, config: &ManagerConfig) -> Result<()> {
        if self.editable {
            let root = self.repo_path.clone();
            return self.process_asset_directory(&root, true, config);
        }

        let root = self.repo_root();
        self.load_versions(&root, true, config)?;

        let released_root = config
            .packages_root
            .join(self.name());
        if !root.starts_with(&config.packages_root) && released_root.is_dir() {
            info!(
                path = %released_root.display(),
                "Repo root outside the main packages root; loading released versions"
            );
            self.load_versions(&released_root, true, config)?;
        }
        Ok(())
    }

    /// Walk previous versions of the package under `repo_root`.
    ///
    /// Only versions at or below the current package version are considered,
    /// by default restricted to the current major. Directories are processed
    /// newest-first so the load depth installs the most recent versions.
    pub fn load_versions(
        &mut self,
        repo_root: &Path,
        same_major_version: bool,
        config: &ManagerConfig,
    ) -> Result<()> {
        let current_version = match &self.package {
            Some(package) => package.version.clone(),
            None => return Ok(()),
        };

        let mut package_versions = list_version_dirs(repo_root)?;
        package_versions.retain(|v| *v <= current_version);
        if same_major_version {
            package_versions.retain(|v| v.major == current_version.major);
        }
        package_versions.sort();
        package_versions.reverse();

        for package_version in package_versions {
            let current = package_version == current_version;
            let version_dir = repo_root.join(package_version.to_string());
            let asset_dir = version_dir.join(ASSET_SUBDIRECTORY);
            self.process_asset_directory(&asset_dir, current, config)?;

            if current {
                let ophide_path = version_dir.join(OPHIDE_FILE);
                if ophide_path.is_file() {
                    self.process_ophide_list(&ophide_path)?;
                }
            }
        }
        Ok(())
    }

    /// Process every library inside one asset directory.
    ///
    /// A missing directory is tolerated for the editable repo and an error
    /// otherwise.
    fn process_asset_directory(
        &mut self,
        asset_dir: &Path,
        current_version: bool,
        config: &ManagerConfig,
    ) -> Result<()> {
        debug!(directory = %asset_dir.display(), "Reading asset directory");

        if !asset_dir.exists() {
            if self.editable {
                info!(directory = %asset_dir.display(), "Couldn't load asset directory");
                return Ok(());
            }
            return Err(Error::AssetDirMissing {
                path: asset_dir.to_path_buf(),
            });
        }

        let mut libraries = Vec::new();
        let entries = fs::read_dir(asset_dir).map_err(|e| Error::io(asset_dir, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| Error::io(asset_dir, e))?;
            let path = entry.path();
            let is_library = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case(LIBRARY_EXTENSION));
            if is_library {
                libraries.push(path);
            }
        }
        libraries.sort();

        for library in libraries {
            self.process_library(&library, current_version, self.editable, config)?;
        }
        Ok(())
    }

    /// Process one expanded library and register the definitions it holds.
    pub fn process_library(
        &mut self,
        path: &Path,
        current_version: bool,
        force: bool,
        config: &ManagerConfig,
    ) -> Result<()> {
        let definitions = definition::definitions_in_library(path)?;
        for def in definitions {
            self.process_definition(&def, current_version, force, config);
        }
        Ok(())
    }

    /// Register a single definition, applying the skip rules:
    ///
    /// - types absent from the current package version are ignored entirely;
    /// - versions already registered by a newer package dir are skipped
    ///   (the editable repo and forced installs bypass this);
    /// - back-version scans never register versions above the current max.
    pub fn process_definition(
        &mut self,
        def: &Definition,
        current_version: bool,
        force: bool,
        config: &ManagerConfig,
    ) {
        let type_name = def.type_name();
        let Some(index) = def.index() else {
            warn!(name = %type_name, "Skipping definition with invalid type name");
            return;
        };

        if !self.node_types.contains_key(&index) {
            if !current_version {
                // Types gone from the latest package version stay unloaded.
                debug!(index = %index, "Skipping type absent from latest version");
                return;
            }
            let namespace = type_name.namespace().unwrap_or_default().to_string();
            self.node_types
                .insert(index.clone(), NodeType::new(namespace, type_name.name()));
        }

        let version_key = match VersionKey::parse(type_name.version()) {
            Ok(key) => key,
            Err(err) => {
                warn!(name = %type_name, error = %err, "Unparsable version, tracking as unversioned");
                VersionKey::Unversioned
            }
        };

        let Some(node_type) = self.node_types.get_mut(&index) else {
            return;
        };

        if !node_type.get_version(&version_key).is_empty() && !self.editable && !force {
            debug!(index = %index, "Version already loaded from another package");
            return;
        }

        if !current_version {
            if let (Some(this_version), Some(max)) = (version_key.as_version(), node_type.latest())
            {
                if this_version > max {
                    debug!(
                        index = %index,
                        version = %this_version,
                        max = %max,
                        "Skipping version above the current maximum"
                    );
                    return;
                }
            }
        }

        node_type.add_version(
            version_key,
            def.library_path().to_path_buf(),
            config.load_depth,
            force,
        );
    }

    /// Apply an ophide list: hide every version of each named type.
    /// Unknown entries are logged and skipped.
    pub fn process_ophide_list(&mut self, ophide_path: &Path) -> Result<()> {
        let contents = fs::read_to_string(ophide_path).map_err(|e| Error::io(ophide_path, e))?;
        let parsed: OphideList =
            serde_json::from_str(&contents).map_err(|e| Error::ConfigParse {
                path: ophide_path.to_path_buf(),
                format: "JSON".into(),
                message: e.to_string(),
            })?;

        let Some(hide_list) = parsed.hide_list else {
            warn!(path = %ophide_path.display(), "hide_list not found in ophide file");
            return Ok(());
        };

        for index in hide_list {
            match self.node_types.get_mut(&index) {
                Some(node_type) => node_type.hide_all_versions(),
                None => {
                    warn!(index = %index, "Skipping ophide for definition not loaded");
                }
            }
        }
        Ok(())
    }

    /// Remove the registry entry for a definition, backing its library up.
    /// Drops the node type when its last version goes.
    pub fn remove_definition(
        &mut self,
        def: &Definition,
        backup_dir: Option<&Path>,
    ) -> Result<()> {
        let index = def.index().ok_or_else(|| Error::InvalidTypeName {
            name: def.type_name().as_str().to_string(),
        })?;
        let version_key = VersionKey::parse(def.type_name().version())?;
        let repo_name = self.name().to_string();

        let node_type = self
            .node_types
            .get_mut(&index)
            .ok_or_else(|| Error::NodeTypeNotFound {
                index: index.clone(),
                repo: repo_name.clone(),
            })?;

        node_type.remove_version(&version_key, def.library_path(), backup_dir)?;

        if node_type.num_versions() == 0 {
            self.node_types.remove(&index);
            debug!(index = %index, repo = %repo_name, "Removed node type");
        } else {
            debug!(index = %index, "More than one version remains");
        }
        Ok(())
    }

    /// Does this repository own the given library path?
    pub fn owns_library(&self, path: &Path) -> bool {
        if self.editable {
            path.starts_with(&self.repo_path)
        } else {
            path.starts_with(self.repo_root())
        }
    }
}

/// Version directories directly under a package root.
fn list_version_dirs(repo_root: &Path) -> Result<Vec<Version>> {
    let mut versions = Vec::new();
    let entries = fs::read_dir(repo_root).map_err(|e| Error::io(repo_root, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| Error::io(repo_root, e))?;
        if !entry.path().is_dir() {
            continue;
        }
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        // Non-version directories (scratch dirs etc) are simply ignored.
        if let Ok(parsed) = version::parse_version(name) {
            versions.push(parsed);
        }
    }
    Ok(versions)
}
