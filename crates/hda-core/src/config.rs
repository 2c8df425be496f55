//! Manager configuration.
//!
//! Settings are loaded from a TOML or JSON file (format detected from the
//! extension) and saved atomically via write-temp-then-rename. The publish
//! lock is environment-driven so a running farm can freeze publishes without
//! touching config files.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Error, Result};

/// Environment variable controlling the publish policy.
pub const PUBLISH_ENV_VAR: &str = "HDAM_PUBLISH";

/// Session-wide publish policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishPolicy {
    /// Publishing is allowed everywhere.
    Unlocked,
    /// Publishing is disabled for this session.
    Locked,
    /// Publishing is restricted to the show repository.
    ShowOnly,
}

impl PublishPolicy {
    /// Read the policy from the environment. Unset or unrecognised values
    /// leave publishing unlocked.
    pub fn from_env() -> Self {
        match env::var(PUBLISH_ENV_VAR).as_deref() {
            Ok("lock") => Self::Locked,
            Ok("show") => Self::ShowOnly,
            _ => Self::Unlocked,
        }
    }

    pub fn allows_publish(&self) -> bool {
        !matches!(self, Self::Locked)
    }
}

/// Settings for one manager session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ManagerConfig {
    /// Root directory of released packages.
    pub packages_root: PathBuf,

    /// URL or path of the asset source repository releases are cut from.
    pub asset_repo: String,

    /// Working area for editable definitions.
    pub edit_dir: PathBuf,

    /// Installed package version directories to scan on load.
    #[serde(default)]
    pub repositories: Vec<PathBuf>,

    /// How many recent versions of each node type stay installed.
    #[serde(default = "default_load_depth")]
    pub load_depth: usize,

    /// External command that builds and releases a package version.
    #[serde(default = "default_build_command")]
    pub build_command: String,

    /// Environment variables passed through to the build command.
    #[serde(default = "default_build_env")]
    pub build_env: Vec<String>,

    /// Package-name prefix that namespace inference strips.
    #[serde(default = "default_package_prefix")]
    pub package_prefix: String,

    /// Namespace prefix that inference substitutes.
    #[serde(default = "default_namespace_prefix")]
    pub namespace_prefix: String,

    /// Package that stays publishable under the show-only policy.
    #[serde(default)]
    pub show_package: Option<String>,
}

fn default_load_depth() -> usize {
    2
}

fn default_build_command() -> String {
    "rez-release".to_string()
}

fn default_build_env() -> Vec<String> {
    ["PATH", "HOME", "USER", "REZ_CONFIG_FILE"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_package_prefix() -> String {
    "houdini_hdas_".to_string()
}

fn default_namespace_prefix() -> String {
    "rebellion.".to_string()
}

impl ManagerConfig {
    /// Load configuration from a file, dispatching on the extension:
    /// `.toml` -> TOML, `.json` -> JSON.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        let config: Self = match extension.as_str() {
            "toml" => toml::from_str(&contents).map_err(|e| Error::ConfigParse {
                path: path.to_path_buf(),
                format: "TOML".into(),
                message: e.to_string(),
            })?,
            "json" => serde_json::from_str(&contents).map_err(|e| Error::ConfigParse {
                path: path.to_path_buf(),
                format: "JSON".into(),
                message: e.to_string(),
            })?,
            _ => {
                return Err(Error::UnsupportedFormat {
                    extension: extension.to_string(),
                });
            }
        };
        debug!(path = %path.display(), "Loaded manager config");
        Ok(config)
    }

    /// Save configuration, format determined from the extension. Uses an
    /// atomic write to avoid torn files.
    pub fn save(&self, path: &Path) -> Result<()> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        let contents = match extension.as_str() {
            "toml" => toml::to_string_pretty(self).map_err(|e| Error::ConfigSerialize {
                path: path.to_path_buf(),
                format: "TOML".into(),
                message: e.to_string(),
            })?,
            "json" => serde_json::to_string_pretty(self).map_err(|e| Error::ConfigSerialize {
                path: path.to_path_buf(),
                format: "JSON".into(),
                message: e.to_string(),
            })?,
            _ => {
                return Err(Error::UnsupportedFormat {
                    extension: extension.to_string(),
                });
            }
        };

        write_atomic(path, contents.as_bytes())
    }

    /// The backup directory for uninstalled editable libraries.
    pub fn backup_dir(&self) -> PathBuf {
        self.edit_dir.join(".backup")
    }

    /// The directory history clones live in.
    pub fn history_dir(&self) -> PathBuf {
        self.edit_dir.join(".history")
    }

    /// The namespace a package name implies, ie. `houdini_hdas_pipeline`
    /// implies `rebellion.pipeline` under the default prefixes.
    pub fn namespace_from_package(&self, package_name: &str) -> Option<String> {
        package_name
            .strip_prefix(&self.package_prefix)
            .map(|rest| format!("{}{rest}", self.namespace_prefix))
    }
}

/// Write content atomically: temp file in the same directory, then rename.
pub fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }

    let temp_name = format!(
        ".{}.{}.tmp",
        path.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        std::process::id()
    );
    let temp_path = path.with_file_name(&temp_name);

    fs::write(&temp_path, content).map_err(|e| Error::io(&temp_path, e))?;
    fs::rename(&temp_path, path).map_err(|e| Error::io(path, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn sample() -> ManagerConfig {
        ManagerConfig {
            packages_root: PathBuf::from("/packages"),
            asset_repo: "/repos/assets.git".to_string(),
            edit_dir: PathBuf::from("/edit"),
            repositories: vec![PathBuf::from("/packages/houdini_hdas_pipeline/1.2.0")],
            load_depth: default_load_depth(),
            build_command: default_build_command(),
            build_env: default_build_env(),
            package_prefix: default_package_prefix(),
            namespace_prefix: default_namespace_prefix(),
            show_package: None,
        }
    }

    #[test]
    fn toml_round_trip() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        let config = sample();
        config.save(&path).unwrap();

        let loaded = ManagerConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn json_round_trip() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.json");
        let config = sample();
        config.save(&path).unwrap();

        let loaded = ManagerConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.ini");
        fs::write(&path, "").unwrap();

        assert!(ManagerConfig::load(&path).is_err());
        assert!(sample().save(&path).is_err());
    }

    #[test]
    fn defaults_fill_optional_fields() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(
            &path,
            "packages_root = \"/packages\"\nasset_repo = \"/repos/assets.git\"\nedit_dir = \"/edit\"\n",
        )
        .unwrap();

        let loaded = ManagerConfig::load(&path).unwrap();
        assert_eq!(loaded.load_depth, 2);
        assert_eq!(loaded.build_command, "rez-release");
        assert!(loaded.repositories.is_empty());
    }

    #[test]
    fn namespace_inference_uses_configured_prefixes() {
        let config = sample();
        assert_eq!(
            config.namespace_from_package("houdini_hdas_pipeline"),
            Some("rebellion.pipeline".to_string())
        );
        assert_eq!(config.namespace_from_package("other_package"), None);
    }
}
