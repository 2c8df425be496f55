//! Versioned package-tree fixtures.
//!
//! A released package lives at `<packages_root>/<package>/<version>/` with a
//! `package.py` manifest and an `hda/` directory of expanded libraries.

use std::fs;
use std::path::{Path, PathBuf};

use crate::library::write_library;

/// Renders a rez-style `package.py` manifest.
pub fn package_py(name: &str, version: &str, commit: Option<&str>) -> String {
    let mut contents = format!(
        "\nname = \"{name}\"\n\nversion = \"{version}\"\n\nauthors = [\n    \"Test User\",\n]\n"
    );
    if let Some(commit) = commit {
        contents.push_str(&format!(
            "\nrevision = \\\n    {{'branch': 'master',\n     'commit': '{commit}',\n     'push_url': 'git@example.com:assets.git'}}\n"
        ));
    }
    contents
}

/// Builder for a versioned package tree.
pub struct PackageTree {
    packages_root: PathBuf,
    name: String,
}

impl PackageTree {
    /// Starts a package tree at `<packages_root>/<name>`.
    pub fn new(packages_root: &Path, name: &str) -> Self {
        Self {
            packages_root: packages_root.to_path_buf(),
            name: name.to_string(),
        }
    }

    /// Path to the package root (the directory holding version dirs).
    pub fn package_root(&self) -> PathBuf {
        self.packages_root.join(&self.name)
    }

    /// Path to one released version directory.
    pub fn version_dir(&self, version: &str) -> PathBuf {
        self.package_root().join(version)
    }

    /// Creates a released version: `package.py` plus an `hda/` directory
    /// containing one library per `(category, type_name)` pair.
    ///
    /// # Panics
    /// Panics on filesystem failure.
    pub fn add_version(&self, version: &str, commit: Option<&str>, assets: &[(&str, &str)]) {
        let version_dir = self.version_dir(version);
        let asset_dir = version_dir.join("hda");
        fs::create_dir_all(&asset_dir)
            .unwrap_or_else(|e| panic!("add_version: failed to create {version}: {e}"));
        fs::write(
            version_dir.join("package.py"),
            package_py(&self.name, version, commit),
        )
        .unwrap_or_else(|e| panic!("add_version: failed to write package.py: {e}"));

        for (category, type_name) in assets {
            write_library(&asset_dir, category, type_name, "");
        }
    }
}
