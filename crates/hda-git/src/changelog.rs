//! Changelog mining.
//!
//! Walks a package repository's history and reconstructs, per commit touching
//! an asset, what changed: the node type version carried by the asset at that
//! commit, the package release the commit first shipped in, and a diff of the
//! asset's `PythonModule` section.

use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone, Utc};
use git2::{Commit, Oid, Repository, Sort, Tree};
use hda_core::TypeName;
use similar::TextDiff;
use tracing::{debug, info, warn};

use crate::repo::GitRepo;
use crate::{Error, Result};

const PACKAGE_FILE: &str = "package.py";
const INDEX_SECTION: &str = "INDEX__SECTION";
const PYTHON_MODULE: &str = "PythonModule";

/// A tagged release of the package, recorded from `package.py` history.
#[derive(Debug, Clone)]
pub struct PackageRelease {
    pub commit: Oid,
    pub tags: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

/// One commit touching an asset directory, annotated for display.
#[derive(Debug, Clone)]
pub struct HistoryRecord {
    pub commit: Oid,
    pub author: String,
    pub date: DateTime<Utc>,
    pub comment: String,
    /// The node type version the asset carried after this commit. Filled in
    /// by [`complete_node_versions`] where the commit did not change it.
    pub node_version: Option<String>,
    /// The package version the change first shipped in, when a later tagged
    /// release exists.
    pub package_version: Option<String>,
    /// Unified diff of the asset's `PythonModule` section, empty when the
    /// commit did not touch it.
    pub python_diff: String,
}

/// Clone or update a package repository into `history_dir` and mine the
/// changelog for `asset_name`.
///
/// When `commit` is given the worktree is checked out at that commit first so
/// the mined history ends at the installed release rather than at trunk.
pub fn mine_history(
    source_url: &str,
    history_dir: &Path,
    package_name: &str,
    commit: Option<&str>,
    asset_name: &str,
) -> Result<Vec<HistoryRecord>> {
    let checkout = history_dir.join(package_name);
    let repo = if checkout.join(".git").exists() {
        let repo = GitRepo::open(&checkout)?;
        repo.reset_hard()?;
        let trunk = repo.default_branch()?;
        repo.checkout_branch(&trunk)?;
        repo.pull(&trunk)?;
        repo
    } else {
        GitRepo::clone(source_url, &checkout)?
    };

    if let Some(commit) = commit {
        repo.checkout_commit(commit)?;
    }

    info!(package = package_name, asset = asset_name, "Mining history");
    let releases = package_releases(repo.raw(), package_name)?;
    let mut records = asset_history(repo.raw(), package_name, asset_name, &releases)?;
    complete_node_versions(&mut records);
    Ok(records)
}

/// Tagged releases of the package, newest last.
///
/// The asset repository holds one directory per package, so the manifest
/// lives at `<package>/package.py`. Only commits that both touch the
/// manifest and carry a tag prefixed by the package name count as releases;
/// untagged edits never shipped, and foreign tags belong to other packages.
pub fn package_releases(repo: &Repository, package_name: &str) -> Result<Vec<PackageRelease>> {
    let mut tags_by_commit: std::collections::HashMap<Oid, Vec<String>> =
        std::collections::HashMap::new();
    repo.tag_foreach(|oid, name| {
        let name = String::from_utf8_lossy(name)
            .trim_start_matches("refs/tags/")
            .to_string();
        let target = repo
            .find_object(oid, None)
            .and_then(|o| o.peel(git2::ObjectType::Commit))
            .map(|c| c.id());
        if let Ok(target) = target {
            tags_by_commit.entry(target).or_default().push(name);
        }
        true
    })?;

    let manifest = PathBuf::from(package_name).join(PACKAGE_FILE);
    let mut releases = Vec::new();
    let mut walk = repo.revwalk()?;
    walk.push_head()?;
    walk.set_sorting(Sort::TIME | Sort::REVERSE)?;
    for oid in walk {
        let oid = oid?;
        let commit = repo.find_commit(oid)?;
        if commit.parent_count() > 1 {
            continue;
        }
        if !commit_touches(&commit, &manifest)? {
            continue;
        }
        let Some(tags) = tags_by_commit.get(&oid) else {
            continue;
        };
        let tags: Vec<String> = tags
            .iter()
            .filter(|t| t.starts_with(package_name))
            .cloned()
            .collect();
        if tags.is_empty() {
            continue;
        }
        releases.push(PackageRelease {
            commit: oid,
            tags,
            timestamp: commit_time(&commit),
        });
    }

    if releases.is_empty() {
        warn!(package = package_name, "No tagged releases found");
    }
    Ok(releases)
}

/// Every commit that touched the asset's directory, oldest first. The asset
/// lives at `<package>/hda/<asset_name>` inside the repository.
pub fn asset_history(
    repo: &Repository,
    package_name: &str,
    asset_name: &str,
    releases: &[PackageRelease],
) -> Result<Vec<HistoryRecord>> {
    let asset_dir = PathBuf::from(package_name).join("hda").join(asset_name);
    let mut records = Vec::new();

    let mut walk = repo.revwalk()?;
    walk.push_head()?;
    walk.set_sorting(Sort::TIME | Sort::REVERSE)?;
    for oid in walk {
        let oid = oid?;
        let commit = repo.find_commit(oid)?;
        // Merge commits re-report the branch's changes against the first
        // parent; the branch commits themselves carry the history.
        if commit.parent_count() > 1 {
            continue;
        }
        if !commit_touches(&commit, &asset_dir)? {
            continue;
        }

        let date = commit_time(&commit);
        let record = HistoryRecord {
            commit: oid,
            author: commit.author().name().unwrap_or("unknown").to_string(),
            date,
            comment: commit.summary().unwrap_or("").to_string(),
            node_version: node_version_change(repo, &commit, &asset_dir)?,
            package_version: shipping_release(releases, date),
            python_diff: python_module_diff(repo, &commit, &asset_dir)?,
        };
        debug!(commit = %oid, "Recorded asset change");
        records.push(record);
    }

    if records.is_empty() {
        return Err(Error::NoReleaseCommit {
            package: asset_name.to_string(),
        });
    }
    Ok(records)
}

/// Fill in node versions for commits that did not change the type name,
/// carrying the last known version forward through time.
pub fn complete_node_versions(records: &mut [HistoryRecord]) {
    let mut current: Option<String> = None;
    for record in records.iter_mut() {
        match &record.node_version {
            Some(version) => current = Some(version.clone()),
            None => {
                if current.is_none() {
                    warn!(commit = %record.commit, "No node version known at this commit");
                }
                record.node_version = current.clone();
            }
        }
    }
}

/// The first tagged release after `date` whose tag names the package.
fn shipping_release(releases: &[PackageRelease], date: DateTime<Utc>) -> Option<String> {
    releases
        .iter()
        .filter(|r| r.timestamp >= date)
        .min_by_key(|r| r.timestamp)
        .and_then(|r| r.tags.first().cloned())
}

/// The node type version after this commit, when the commit changed the
/// `Operator:` line of the asset's index section.
fn node_version_change(
    repo: &Repository,
    commit: &Commit,
    asset_dir: &Path,
) -> Result<Option<String>> {
    let after = operator_in_tree(repo, &commit.tree()?, asset_dir)?;
    let before = match commit.parent(0) {
        Ok(parent) => operator_in_tree(repo, &parent.tree()?, asset_dir)?,
        Err(_) => None,
    };
    if after == before {
        return Ok(None);
    }
    Ok(after.and_then(|op| version_from_operator(&op)))
}

/// Unified diff of the asset's `PythonModule` section across this commit.
fn python_module_diff(repo: &Repository, commit: &Commit, asset_dir: &Path) -> Result<String> {
    let after = section_in_tree(repo, &commit.tree()?, asset_dir, PYTHON_MODULE)?;
    let before = match commit.parent(0) {
        Ok(parent) => section_in_tree(repo, &parent.tree()?, asset_dir, PYTHON_MODULE)?,
        Err(_) => None,
    };
    if after == before {
        return Ok(String::new());
    }
    let before = before.unwrap_or_default();
    let after = after.unwrap_or_default();
    let diff = TextDiff::from_lines(&before, &after);
    Ok(diff.unified_diff().context_radius(3).to_string())
}

/// Did this commit change anything under `path`?
fn commit_touches(commit: &Commit, path: &Path) -> Result<bool> {
    let tree = commit.tree()?;
    if commit.parent_count() == 0 {
        return Ok(tree_lookup(&tree, path).is_some());
    }
    for parent in commit.parents() {
        let parent_tree = parent.tree()?;
        let entry = tree_lookup(&tree, path);
        let parent_entry = tree_lookup(&parent_tree, path);
        let changed = match (&entry, &parent_entry) {
            (Some(a), Some(b)) => a != b,
            (None, None) => false,
            _ => true,
        };
        if changed {
            return Ok(true);
        }
    }
    Ok(false)
}

fn tree_lookup(tree: &Tree, path: &Path) -> Option<Oid> {
    tree.get_path(path).ok().map(|e| e.id())
}

/// The `Operator:` value from the first `INDEX__SECTION` found under
/// `asset_dir` in the tree, searched recursively.
fn operator_in_tree(repo: &Repository, tree: &Tree, asset_dir: &Path) -> Result<Option<String>> {
    let Some(content) = section_in_tree(repo, tree, asset_dir, INDEX_SECTION)? else {
        return Ok(None);
    };
    for line in content.lines() {
        if let Some(rest) = line.strip_prefix("Operator:") {
            return Ok(Some(rest.trim().to_string()));
        }
    }
    Ok(None)
}

/// The content of the first file named `file_name` found under `asset_dir`.
fn section_in_tree(
    repo: &Repository,
    tree: &Tree,
    asset_dir: &Path,
    file_name: &str,
) -> Result<Option<String>> {
    let Ok(entry) = tree.get_path(asset_dir) else {
        return Ok(None);
    };
    let Ok(object) = entry.to_object(repo) else {
        return Ok(None);
    };
    let Some(subtree) = object.as_tree() else {
        return Ok(None);
    };
    find_file_in_tree(repo, subtree, file_name)
}

fn find_file_in_tree(repo: &Repository, tree: &Tree, file_name: &str) -> Result<Option<String>> {
    for entry in tree.iter() {
        let name = entry.name().unwrap_or("");
        match entry.kind() {
            Some(git2::ObjectType::Blob) if name == file_name => {
                let blob = repo.find_blob(entry.id())?;
                return Ok(Some(String::from_utf8_lossy(blob.content()).to_string()));
            }
            Some(git2::ObjectType::Tree) => {
                let object = entry.to_object(repo)?;
                if let Some(subtree) = object.as_tree()
                    && let Some(found) = find_file_in_tree(repo, subtree, file_name)?
                {
                    return Ok(Some(found));
                }
            }
            _ => {}
        }
    }
    Ok(None)
}

/// The version component of a `namespace::name::version` type name.
fn version_from_operator(operator: &str) -> Option<String> {
    TypeName::new(operator).version().map(str::to_string)
}

fn commit_time(commit: &Commit) -> DateTime<Utc> {
    Utc.timestamp_opt(commit.time().seconds(), 0)
        .single()
        .unwrap_or_default()
}
