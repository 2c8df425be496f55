//! Repository operations over git2.

use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone, Utc};
use git2::{
    BranchType, MergeOptions, Oid, Repository, Signature, StatusOptions, build::CheckoutBuilder,
};
use tracing::{debug, info};

use crate::{Error, Result};

/// Branch names tried when resolving the trunk.
const DEFAULT_BRANCHES: [&str; 2] = ["master", "main"];

/// A lightweight tag and the commit it points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagInfo {
    pub name: String,
    pub target: Oid,
    pub timestamp: DateTime<Utc>,
}

/// One opened git repository.
pub struct GitRepo {
    repo: Repository,
    workdir: PathBuf,
}

impl GitRepo {
    /// Clone `url` into `dest`.
    pub fn clone(url: &str, dest: &Path) -> Result<Self> {
        info!(url, dest = %dest.display(), "Cloning repository");
        let repo = Repository::clone(url, dest)?;
        Self::from_repo(repo)
    }

    /// Open an existing repository.
    pub fn open(path: &Path) -> Result<Self> {
        let repo = Repository::open(path)?;
        Self::from_repo(repo)
    }

    fn from_repo(repo: Repository) -> Result<Self> {
        let workdir = repo
            .workdir()
            .map(Path::to_path_buf)
            .ok_or_else(|| Error::PullFailed {
                message: "repository has no working directory".into(),
            })?;
        Ok(Self { repo, workdir })
    }

    /// The working directory of this repository.
    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// The branch HEAD currently points at.
    pub fn current_branch(&self) -> Result<String> {
        let head = self.repo.head()?;
        if head.is_branch() {
            Ok(head.shorthand().unwrap_or("HEAD").to_string())
        } else {
            Ok("HEAD".to_string())
        }
    }

    /// The trunk branch: `master` when present, otherwise `main`.
    pub fn default_branch(&self) -> Result<String> {
        for name in DEFAULT_BRANCHES {
            if self.repo.find_branch(name, BranchType::Local).is_ok() {
                return Ok(name.to_string());
            }
        }
        Err(Error::NoDefaultBranch {
            tried: DEFAULT_BRANCHES.join(", "),
        })
    }

    /// Create a branch at HEAD and check it out.
    pub fn create_branch(&self, name: &str) -> Result<()> {
        let head_commit = self.repo.head()?.peel_to_commit()?;
        self.repo.branch(name, &head_commit, false)?;
        self.checkout_branch(name)?;
        debug!(branch = name, "Created release branch");
        Ok(())
    }

    /// Check out an existing local branch.
    pub fn checkout_branch(&self, name: &str) -> Result<()> {
        let refname = format!("refs/heads/{name}");
        self.repo
            .find_reference(&refname)
            .map_err(|_| Error::BranchNotFound {
                name: name.to_string(),
            })?;
        self.repo.set_head(&refname)?;
        self.repo
            .checkout_head(Some(CheckoutBuilder::default().force()))?;
        Ok(())
    }

    /// Check out a specific commit, detaching HEAD.
    pub fn checkout_commit(&self, commit: &str) -> Result<()> {
        let oid = Oid::from_str(commit)?;
        let commit = self.repo.find_commit(oid)?;
        self.repo.set_head_detached(commit.id())?;
        self.repo
            .checkout_head(Some(CheckoutBuilder::default().force()))?;
        Ok(())
    }

    /// Discard every local modification.
    pub fn reset_hard(&self) -> Result<()> {
        let head = self.repo.head()?.peel_to_commit()?;
        self.repo
            .reset(head.as_object(), git2::ResetType::Hard, None)?;
        Ok(())
    }

    /// Does the worktree hold modifications or untracked files?
    pub fn has_changes(&self) -> Result<bool> {
        let mut options = StatusOptions::new();
        options.include_untracked(true).recurse_untracked_dirs(true);
        let statuses = self.repo.statuses(Some(&mut options))?;
        Ok(!statuses.is_empty())
    }

    /// Stage everything and commit. Returns the new commit id.
    pub fn commit_all(&self, message: &str) -> Result<Oid> {
        let mut index = self.repo.index()?;
        index.add_all(["*"], git2::IndexAddOption::DEFAULT, None)?;
        index.update_all(["*"], None)?;
        index.write()?;
        self.commit_index(message)
    }

    /// Stage one path (relative to the workdir) and commit.
    pub fn commit_path(&self, path: &Path, message: &str) -> Result<Oid> {
        let mut index = self.repo.index()?;
        index.add_path(path)?;
        index.write()?;
        self.commit_index(message)
    }

    fn commit_index(&self, message: &str) -> Result<Oid> {
        let mut index = self.repo.index()?;
        let tree_id = index.write_tree()?;
        let tree = self.repo.find_tree(tree_id)?;
        let signature = self.signature()?;
        let head_commit = self.repo.head()?.peel_to_commit()?;
        let oid = self.repo.commit(
            Some("HEAD"),
            &signature,
            &signature,
            message,
            &tree,
            &[&head_commit],
        )?;
        debug!(commit = %oid, "Committed");
        Ok(oid)
    }

    fn signature(&self) -> Result<Signature<'_>> {
        match self.repo.signature() {
            Ok(sig) => Ok(sig),
            // Release hosts without a configured identity fall back to the
            // manager's own.
            Err(_) => Ok(Signature::now("hda-manager", "hda-manager@localhost")?),
        }
    }

    /// Push a branch to `origin`. Relies on credential helpers for auth.
    pub fn push(&self, branch: &str) -> Result<()> {
        let mut remote =
            self.repo
                .find_remote("origin")
                .map_err(|_| Error::RemoteNotFound {
                    name: "origin".to_string(),
                })?;
        let refspec = format!("refs/heads/{branch}:refs/heads/{branch}");
        remote
            .push(&[refspec.as_str()], None)
            .map_err(|e| Error::PushFailed {
                message: e.message().to_string(),
            })?;
        debug!(branch, "Pushed");
        Ok(())
    }

    /// Fetch `branch` from origin and fast-forward the local branch to it.
    pub fn pull(&self, branch: &str) -> Result<()> {
        let mut remote =
            self.repo
                .find_remote("origin")
                .map_err(|_| Error::RemoteNotFound {
                    name: "origin".to_string(),
                })?;

        remote
            .fetch(&[branch], None, None)
            .map_err(|e| Error::PullFailed {
                message: format!("Fetch failed: {}", e.message()),
            })?;

        let fetch_head =
            self.repo
                .find_reference("FETCH_HEAD")
                .map_err(|e| Error::PullFailed {
                    message: format!("Could not find FETCH_HEAD: {}", e.message()),
                })?;
        let fetch_commit = fetch_head.peel_to_commit().map_err(|e| Error::PullFailed {
            message: format!("Could not resolve FETCH_HEAD: {}", e.message()),
        })?;

        let annotated = self.repo.find_annotated_commit(fetch_commit.id())?;
        let (analysis, _) = self.repo.merge_analysis(&[&annotated])?;

        if analysis.is_up_to_date() {
            return Ok(());
        }
        if analysis.is_fast_forward() {
            let refname = format!("refs/heads/{branch}");
            let mut reference = self.repo.find_reference(&refname)?;
            reference.set_target(
                fetch_commit.id(),
                &format!("pull: fast-forward to {}", fetch_commit.id()),
            )?;
            self.repo
                .checkout_head(Some(CheckoutBuilder::default().force()))?;
            return Ok(());
        }

        Err(Error::CannotFastForward {
            message: format!("cannot fast-forward {branch} to {}", fetch_commit.id()),
        })
    }

    /// Merge `source` into the current branch with a merge commit, the
    /// `--no-ff` contract. Conflicts abort the merge and error.
    pub fn merge_no_ff(&self, source: &str) -> Result<()> {
        let source_branch = self
            .repo
            .find_branch(source, BranchType::Local)
            .map_err(|_| Error::BranchNotFound {
                name: source.to_string(),
            })?;
        let source_commit = source_branch.get().peel_to_commit()?;
        let annotated = self.repo.find_annotated_commit(source_commit.id())?;

        let (analysis, _) = self.repo.merge_analysis(&[&annotated])?;
        if analysis.is_up_to_date() {
            return Ok(());
        }

        let mut merge_opts = MergeOptions::new();
        self.repo
            .merge(&[&annotated], Some(&mut merge_opts), None)?;

        let mut index = self.repo.index()?;
        if index.has_conflicts() {
            self.repo.cleanup_state()?;
            return Err(Error::MergeConflict {
                branch: source.to_string(),
            });
        }

        let signature = self.signature()?;
        let tree_id = index.write_tree()?;
        let tree = self.repo.find_tree(tree_id)?;
        let head_commit = self.repo.head()?.peel_to_commit()?;
        let message = format!("Merge branch '{source}'");
        self.repo.commit(
            Some("HEAD"),
            &signature,
            &signature,
            &message,
            &tree,
            &[&head_commit, &source_commit],
        )?;
        self.repo.cleanup_state()?;
        debug!(source, "Merged");
        Ok(())
    }

    /// Every tag and the commit it points at.
    pub fn tags(&self) -> Result<Vec<TagInfo>> {
        let mut tags = Vec::new();
        let names = self.repo.tag_names(None)?;
        for name in names.iter().flatten() {
            let refname = format!("refs/tags/{name}");
            let reference = match self.repo.find_reference(&refname) {
                Ok(r) => r,
                Err(_) => continue,
            };
            let commit = match reference.peel_to_commit() {
                Ok(c) => c,
                Err(_) => continue,
            };
            let timestamp = Utc
                .timestamp_opt(commit.time().seconds(), 0)
                .single()
                .unwrap_or_default();
            tags.push(TagInfo {
                name: name.to_string(),
                target: commit.id(),
                timestamp,
            });
        }
        Ok(tags)
    }

    /// Borrow the underlying git2 repository.
    pub fn raw(&self) -> &Repository {
        &self.repo
    }
}
