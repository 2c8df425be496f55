//! Package manifests.
//!
//! Every released repository version carries a rez-style `package.py`. The
//! file is foreign Python and is never evaluated — the name, version and
//! release commit are scraped with regexes, exactly the fields the manager
//! needs. The version bump used during release rewrites only the
//! `version = "..."` line.

use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use semver::Version;
use tracing::{debug, warn};

use crate::version::{self, Bump};
use crate::{Error, Result};

static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?m)^name\s*=\s*["'](.+)["']"#).expect("static regex"));
static VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?m)^version\s*=\s*["'](.+)["']"#).expect("static regex"));
static REVISION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\nrevision\s*=.*?\{.*?\}").expect("static regex"));
static COMMIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"'commit':\s*'([^']*)'").expect("static regex"));
static QUOTED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""([^"]*)""#).expect("static regex"));

/// Fields scraped from a `package.py` manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageDetails {
    /// Package name, ie. `houdini_hdas_pipeline`.
    pub name: String,
    /// Released package version.
    pub version: Version,
    /// Source-control commit the release was cut from, when recorded.
    pub commit: Option<String>,
}

impl PackageDetails {
    /// Scrape `package.py` at the given path.
    ///
    /// Name and version are required; a missing release commit is tolerated
    /// (history lookups then fail per-operation).
    pub fn load(package_py: &Path) -> Result<Self> {
        let contents = fs::read_to_string(package_py).map_err(|e| Error::io(package_py, e))?;

        let name = NAME_RE
            .captures(&contents)
            .map(|c| c[1].to_string())
            .ok_or_else(|| Error::invalid_package(package_py, "name field not found"))?;

        let raw_version = VERSION_RE
            .captures(&contents)
            .map(|c| c[1].to_string())
            .ok_or_else(|| Error::invalid_package(package_py, "version field not found"))?;
        let version = version::parse_version(&raw_version)?;

        let commit = REVISION_RE
            .find(&contents)
            .and_then(|block| COMMIT_RE.captures(block.as_str()))
            .map(|c| c[1].to_string());

        match &commit {
            Some(_) => debug!(package = %name, "Release commit found"),
            None => warn!(package = %name, "Release commit not found"),
        }

        debug!(package = %name, version = %version, "Loaded package details");
        Ok(Self {
            name,
            version,
            commit,
        })
    }
}

/// Bump the version line of a `package.py` in place.
///
/// Errors when the version line holds anything but exactly one quoted string.
/// Returns the new version.
pub fn bump_package_version(package_py: &Path, bump: Bump) -> Result<Version> {
    let contents = fs::read_to_string(package_py).map_err(|e| Error::io(package_py, e))?;

    let mut new_version = None;
    let mut updated = Vec::with_capacity(contents.lines().count());
    for line in contents.lines() {
        if line.starts_with("version") {
            let quoted: Vec<&str> = QUOTED_RE
                .captures_iter(line)
                .map(|c| c.get(1).map(|m| m.as_str()).unwrap_or(""))
                .collect();
            if quoted.len() != 1 {
                return Err(Error::invalid_package(
                    package_py,
                    format!(
                        "found {} version strings on the version line, should be one",
                        quoted.len()
                    ),
                ));
            }
            let current = version::parse_version(quoted[0])?;
            let bumped = version::bump(&current, bump);
            updated.push(format!("version = \"{bumped}\""));
            new_version = Some(bumped);
        } else {
            updated.push(line.to_string());
        }
    }

    let new_version = new_version
        .ok_or_else(|| Error::invalid_package(package_py, "version field not found"))?;

    fs::write(package_py, updated.join("\n") + "\n").map_err(|e| Error::io(package_py, e))?;
    debug!(version = %new_version, path = %package_py.display(), "Bumped package version");
    Ok(new_version)
}
