//! End-to-end session tests: load a versioned package tree, check the
//! registry state, and walk a working copy through edit and configure.

use std::fs;

use pretty_assertions::assert_eq;
use semver::Version;
use tempfile::TempDir;

use hda_core::{AssetManager, Bump, ManagerConfig, VersionKey};
use hda_test_utils::package::PackageTree;

const PACKAGE: &str = "houdini_hdas_pipeline";
const SCATTER: &str = "rebellion.pipeline::scatter";

fn seeded_config(tmp: &TempDir) -> ManagerConfig {
    let packages_root = tmp.path().join("packages");
    let tree = PackageTree::new(&packages_root, PACKAGE);
    tree.add_version("1.0.0", None, &[("Sop", &format!("{SCATTER}::1.0.0"))]);
    tree.add_version("1.1.0", None, &[("Sop", &format!("{SCATTER}::1.1.0"))]);
    tree.add_version(
        "1.2.0",
        None,
        &[
            ("Sop", &format!("{SCATTER}::1.2.0")),
            ("Lop", "rebellion.pipeline::reference::1.0.0"),
        ],
    );

    ManagerConfig {
        packages_root,
        asset_repo: tmp.path().join("assets.git").display().to_string(),
        edit_dir: tmp.path().join("edit"),
        repositories: vec![tree.version_dir("1.2.0")],
        load_depth: 2,
        build_command: "rez-release".into(),
        build_env: vec![],
        package_prefix: "houdini_hdas_".into(),
        namespace_prefix: "rebellion.".into(),
        show_package: None,
    }
}

#[test]
fn load_depth_splits_installed_and_indexed_versions() {
    let tmp = TempDir::new().unwrap();
    let manager = AssetManager::load(seeded_config(&tmp)).unwrap();

    let repo = manager
        .repo_from_namespace("rebellion.pipeline")
        .unwrap();
    let scatter = repo.node_type("rebellion.pipeline::Sop/scatter").unwrap();

    assert_eq!(scatter.num_versions(), 3);
    assert_eq!(scatter.latest(), Some(&Version::new(1, 2, 0)));

    let installed: Vec<VersionKey> = scatter
        .installed_versions()
        .keys()
        .map(|k| (*k).clone())
        .collect();
    assert_eq!(
        installed,
        vec![
            VersionKey::Semver(Version::new(1, 1, 0)),
            VersionKey::Semver(Version::new(1, 2, 0)),
        ]
    );
    let indexed: Vec<VersionKey> = scatter
        .uninstalled_versions()
        .keys()
        .map(|k| (*k).clone())
        .collect();
    assert_eq!(indexed, vec![VersionKey::Semver(Version::new(1, 0, 0))]);
}

#[test]
fn session_spans_every_category_in_the_current_version() {
    let tmp = TempDir::new().unwrap();
    let manager = AssetManager::load(seeded_config(&tmp)).unwrap();

    let repo = manager
        .repo_from_namespace("rebellion.pipeline")
        .unwrap();
    assert!(repo.node_type("rebellion.pipeline::Lop/reference").is_some());
    assert_eq!(manager.all_available_namespaces(), vec!["rebellion.pipeline"]);
}

#[test]
fn edit_then_configure_walks_the_version_line() {
    let tmp = TempDir::new().unwrap();
    let config = seeded_config(&tmp);
    let released = config
        .packages_root
        .join(PACKAGE)
        .join("1.2.0/hda/Sop_rebellion.pipeline_scatter.hda");
    let mut manager = AssetManager::load(config).unwrap();

    let copy = manager.edit_definition(&released).unwrap();
    assert!(manager.is_editable_library(copy.library_path()));
    assert!(manager.is_latest_version(&copy));

    let configured = manager
        .configure_definition(copy.library_path(), None, None, Some(Bump::Minor))
        .unwrap();
    assert_eq!(
        configured.type_name().as_str(),
        "rebellion.pipeline::scatter::1.3.0"
    );

    // The old working copy was backed up, the renamed copy replaced it.
    let copies: Vec<_> = fs::read_dir(tmp.path().join("edit"))
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_dir() && !e.file_name().to_string_lossy().starts_with('.'))
        .collect();
    assert_eq!(copies.len(), 1);
}

#[test]
fn prepare_publish_stages_a_release() {
    let tmp = TempDir::new().unwrap();
    let config = seeded_config(&tmp);
    let released = config
        .packages_root
        .join(PACKAGE)
        .join("1.2.0/hda/Sop_rebellion.pipeline_scatter.hda");
    let mut manager = AssetManager::load(config).unwrap();

    let copy = manager.edit_definition(&released).unwrap();
    let prepared = manager
        .prepare_publish(copy.library_path(), "Scatter fixes")
        .unwrap();

    assert_eq!(prepared.package, PACKAGE);
    assert_eq!(prepared.asset_name, "Sop_rebellion.pipeline_scatter.hda");
    assert!(prepared.branch.starts_with("release_Sop-rebellion.pipeline-scatter"));
    assert!(
        prepared
            .release_dir
            .join("Sop_rebellion.pipeline_scatter.hda")
            .is_dir()
    );
}
