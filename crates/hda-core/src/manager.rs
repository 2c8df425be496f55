//! The asset manager.
//!
//! Aggregates the editable working area and every configured package
//! repository, resolves namespaces, and drives the edit / discard /
//! configure / publish-preparation operations the CLI exposes.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use semver::Version;
use tracing::{debug, info};

use crate::config::{ManagerConfig, PublishPolicy};
use crate::definition::{self, Definition};
use crate::ident::{self, TypeName};
use crate::registry::NodeType;
use crate::repo::AssetRepo;
use crate::validate::PublishChecks;
use crate::version::{self, Bump};
use crate::{Error, Result};

/// Everything the release workflow needs, assembled before any git or
/// subprocess work starts. All session-side operations are complete once
/// this exists, so the release itself can run anywhere.
#[derive(Debug, Clone)]
pub struct PreparedRelease {
    /// Scratch directory the release runs in; holds the expanded asset.
    pub release_dir: PathBuf,
    /// Full type name of the definition being released.
    pub node_type_name: TypeName,
    /// Release branch name.
    pub branch: String,
    /// Expanded library name inside the package's asset directory.
    pub asset_name: String,
    /// Package the asset belongs to.
    pub package: String,
    /// Release comment.
    pub comment: String,
}

/// The running manager session.
#[derive(Debug)]
pub struct AssetManager {
    config: ManagerConfig,
    policy: PublishPolicy,
    repos: Vec<AssetRepo>,
}

impl AssetManager {
    /// Load a manager session: the editable repo first, then every
    /// configured package repository.
    pub fn load(config: ManagerConfig) -> Result<Self> {
        fs::create_dir_all(&config.edit_dir).map_err(|e| Error::io(&config.edit_dir, e))?;

        let mut repos = Vec::with_capacity(config.repositories.len() + 1);
        let mut editable = AssetRepo::open(&config.edit_dir, true)?;
        editable.load(&config)?;
        repos.push(editable);

        for path in &config.repositories {
            let mut repo = AssetRepo::open(path, false)?;
            repo.load(&config)?;
            repos.push(repo);
        }

        info!(repos = repos.len(), "Loaded asset manager");
        Ok(Self {
            config,
            policy: PublishPolicy::from_env(),
            repos,
        })
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    pub fn policy(&self) -> PublishPolicy {
        self.policy
    }

    /// Override the environment-derived publish policy for this session.
    pub fn set_policy(&mut self, policy: PublishPolicy) {
        self.policy = policy;
    }

    /// All repositories, the editable working area first.
    pub fn repos(&self) -> &[AssetRepo] {
        &self.repos
    }

    fn editable_repo_mut(&mut self) -> &mut AssetRepo {
        // Construction guarantees index 0 is the editable repo.
        &mut self.repos[0]
    }

    /// Every namespace the configured repositories can publish into.
    pub fn all_available_namespaces(&self) -> Vec<String> {
        let mut namespaces: Vec<String> = self
            .repos
            .iter()
            .flat_map(|repo| repo.available_namespaces(&self.config))
            .collect();
        namespaces.sort();
        namespaces.dedup();
        namespaces
    }

    /// The repository that publishes into the given namespace.
    pub fn repo_from_namespace(&self, namespace: &str) -> Result<&AssetRepo> {
        self.repos
            .iter()
            .find(|repo| {
                repo.available_namespaces(&self.config)
                    .iter()
                    .any(|ns| ns == namespace)
            })
            .ok_or_else(|| Error::NamespaceNotFound {
                namespace: namespace.to_string(),
            })
    }

    /// The repository owning the given library path, the editable working
    /// area taking precedence.
    pub fn repo_from_library(&self, path: &Path) -> Result<&AssetRepo> {
        self.repos
            .iter()
            .find(|repo| repo.owns_library(path))
            .ok_or_else(|| Error::RepoNotFound {
                path: path.to_path_buf(),
            })
    }

    /// Is this library a working copy in the edit directory?
    pub fn is_editable_library(&self, path: &Path) -> bool {
        path.starts_with(&self.config.edit_dir)
    }

    /// The registered node type for a definition, searched across all repos.
    pub fn node_type_from_definition(&self, def: &Definition) -> Option<&NodeType> {
        let index = def.index()?;
        self.repos.iter().find_map(|repo| repo.node_type(&index))
    }

    /// The latest registered version of a type, across every repository.
    /// `None` for unknown types.
    pub fn current_node_type_version(
        &self,
        category: &str,
        namespace: &str,
        name: &str,
    ) -> Option<Version> {
        let index = ident::index_from_components(namespace, name, category);
        self.repos
            .iter()
            .filter_map(|repo| repo.node_type(&index))
            .filter_map(|node_type| node_type.latest().cloned())
            .max()
    }

    /// The publish gate: is the definition at or above the latest registered
    /// version of its type? Unknown types are trivially latest.
    pub fn is_latest_version(&self, def: &Definition) -> bool {
        let namespace = def.type_name().namespace().unwrap_or_default();
        let current = self.current_node_type_version(
            def.category(),
            namespace,
            def.type_name().name(),
        );
        match current {
            None => true,
            Some(latest) => def
                .type_name()
                .version()
                .and_then(|v| version::parse_version(v).ok())
                .is_some_and(|v| v >= latest),
        }
    }

    /// Check a working copy out of a repository: copy the library into the
    /// edit directory under a timestamped name and force-install the copy.
    pub fn edit_definition(&mut self, library: &Path) -> Result<Definition> {
        let def = definition::single_definition(library)?;
        let editable_name =
            ident::editable_library_name(def.category(), def.type_name(), Utc::now());

        let copy = def.copy_to_library(&self.config.edit_dir, &editable_name, None)?;
        let config = self.config.clone();
        self.editable_repo_mut()
            .process_library(copy.library_path(), true, true, &config)?;

        info!(name = %copy.type_name(), path = %copy.library_path().display(), "Definition editable");
        Ok(copy)
    }

    /// Drop a working copy: remove it from the registry and move the library
    /// into the backup directory.
    pub fn discard_definition(&mut self, library: &Path) -> Result<()> {
        if !self.is_editable_library(library) {
            return Err(Error::RepoNotFound {
                path: library.to_path_buf(),
            });
        }
        let def = definition::single_definition(library)?;
        let backup_dir = self.config.backup_dir();
        self.editable_repo_mut()
            .remove_definition(&def, Some(&backup_dir))?;
        info!(name = %def.type_name(), "Discarded editable definition");
        Ok(())
    }

    /// Rename and/or re-version a working copy.
    ///
    /// The new version comes from the bump request resolved against the
    /// latest registered version of the *target* type, so renaming onto an
    /// existing type continues its version line. The old working copy is
    /// removed (backed up); the renamed copy replaces it.
    pub fn configure_definition(
        &mut self,
        library: &Path,
        namespace: Option<&str>,
        name: Option<&str>,
        bump: Option<Bump>,
    ) -> Result<Definition> {
        if !self.is_editable_library(library) {
            return Err(Error::RepoNotFound {
                path: library.to_path_buf(),
            });
        }
        if namespace.is_none() && name.is_none() && bump.is_none() {
            return Err(Error::NothingToUpdate {
                path: library.to_path_buf(),
            });
        }

        let def = definition::single_definition(library)?;

        if let Some(namespace) = namespace {
            let available = self.all_available_namespaces();
            if !available.iter().any(|ns| ns == namespace) {
                return Err(Error::InvalidNamespace {
                    namespace: namespace.to_string(),
                    available: available.join(", "),
                });
            }
        }

        let target_namespace = match namespace.or_else(|| def.type_name().namespace()) {
            Some(ns) => ns.to_string(),
            None => {
                return Err(Error::InvalidTypeName {
                    name: def.type_name().as_str().to_string(),
                });
            }
        };
        let target_name = name.unwrap_or_else(|| def.type_name().name()).to_string();

        let current =
            self.current_node_type_version(def.category(), &target_namespace, &target_name);
        let new_version = version::resolve_bump(current.as_ref(), bump);
        let new_type_name = TypeName::from_components(
            &target_namespace,
            &target_name,
            &new_version.to_string(),
        );
        debug!(from = %def.type_name(), to = %new_type_name, "Configuring definition");

        let editable_name =
            ident::editable_library_name(def.category(), &new_type_name, Utc::now());
        let copy = def.copy_to_library(&self.config.edit_dir, &editable_name, Some(&new_type_name))?;

        let config = self.config.clone();
        let backup_dir = config.backup_dir();
        let editable = self.editable_repo_mut();
        editable.process_library(copy.library_path(), true, true, &config)?;
        editable.remove_definition(&def, Some(&backup_dir))?;

        Ok(copy)
    }

    /// Validate a working copy and assemble everything the release workflow
    /// needs: a scratch directory holding the expanded asset, the release
    /// branch name, and the owning package.
    pub fn prepare_publish(&self, library: &Path, comment: &str) -> Result<PreparedRelease> {
        if !self.policy.allows_publish() {
            return Err(Error::PublishLocked);
        }
        if !self.is_editable_library(library) {
            return Err(Error::RepoNotFound {
                path: library.to_path_buf(),
            });
        }

        let def = definition::single_definition(library)?;
        PublishChecks::run(self, &def)?;

        let namespace = def.type_name().namespace().ok_or_else(|| {
            Error::InvalidTypeName {
                name: def.type_name().as_str().to_string(),
            }
        })?;
        let package = self.repo_from_namespace(namespace)?.name().to_string();

        if self.policy == PublishPolicy::ShowOnly
            && self.config.show_package.as_deref() != Some(package.as_str())
        {
            return Err(Error::PublishRestricted { package });
        }

        let branch = ident::release_branch_name(def.category(), def.type_name(), Utc::now());
        let asset_name = ident::expanded_library_name(def.category(), def.type_name());

        let release_dir = self.config.edit_dir.join(".release").join(&branch);
        def.copy_to_library(&release_dir, &asset_name, None)?;

        info!(name = %def.type_name(), branch = %branch, "Prepared release");
        Ok(PreparedRelease {
            release_dir,
            node_type_name: def.type_name().clone(),
            branch,
            asset_name,
            package,
            comment: comment.to_string(),
        })
    }
}
