//! End-to-end release test: edit a released library, publish it through the
//! release workflow against a local bare origin, and mine the changelog of
//! the shipped asset.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use pretty_assertions::assert_eq;
use semver::Version;
use tempfile::TempDir;

use hda_core::{AssetManager, ManagerConfig};
use hda_git::changelog;
use hda_release::ReleaseJob;
use hda_test_utils::{git, library, package::PackageTree};

const PACKAGE: &str = "houdini_hdas_pipeline";
const TYPE_NAME: &str = "rebellion.pipeline::scatter::1.2.0";
const ASSET: &str = "Sop_rebellion.pipeline_scatter.hda";

struct Stage {
    tmp: TempDir,
    config: ManagerConfig,
    released_library: PathBuf,
}

/// A released package tree at 1.2.0, a bare asset origin carrying the same
/// version, and a build script that installs 1.3.0 into the packages root.
fn stage() -> Stage {
    let tmp = TempDir::new().unwrap();
    let packages_root = tmp.path().join("packages");
    let tree = PackageTree::new(&packages_root, PACKAGE);
    tree.add_version("1.2.0", None, &[("Sop", TYPE_NAME)]);
    let released_library = tree.version_dir("1.2.0").join("hda").join(ASSET);

    // Asset source repository, published as a bare origin. Each package
    // lives in its own subdirectory of the repository.
    let work = tmp.path().join("work");
    let work_package = work.join(PACKAGE);
    fs::create_dir_all(&work_package).unwrap();
    git::real_git_repo_with_commit(&work);
    fs::write(
        work_package.join("package.py"),
        hda_test_utils::package::package_py(PACKAGE, "1.2.0", None),
    )
    .unwrap();
    library::write_library(
        &work_package.join("hda"),
        "Sop",
        TYPE_NAME,
        "def run():\n    pass\n",
    );
    git::commit_all(&work, "Add scatter");
    git::run_git(
        tmp.path(),
        &["clone", "--bare", work.to_str().unwrap(), "origin.git"],
    );

    let build_script = tmp.path().join("build.sh");
    fs::write(
        &build_script,
        format!(
            "#!/bin/sh\nPATH=/usr/bin:/bin\nmkdir -p {root}/{PACKAGE}/1.3.0/hda\ncp -r hda/{ASSET} {root}/{PACKAGE}/1.3.0/hda/\ncp package.py {root}/{PACKAGE}/1.3.0/\n",
            root = packages_root.display()
        ),
    )
    .unwrap();
    fs::set_permissions(&build_script, fs::Permissions::from_mode(0o755)).unwrap();

    let config = ManagerConfig {
        packages_root,
        asset_repo: tmp.path().join("origin.git").display().to_string(),
        edit_dir: tmp.path().join("edit"),
        repositories: vec![tree.version_dir("1.2.0")],
        load_depth: 2,
        build_command: build_script.display().to_string(),
        build_env: vec![],
        package_prefix: "houdini_hdas_".into(),
        namespace_prefix: "rebellion.".into(),
        show_package: None,
    };
    Stage {
        tmp,
        config,
        released_library,
    }
}

fn edit_and_modify(manager: &mut AssetManager, released: &Path) -> PathBuf {
    let copy = manager.edit_definition(released).unwrap();
    let module = copy.section_path("PythonModule");
    fs::write(&module, "def run():\n    do_work()\n").unwrap();
    copy.library_path().to_path_buf()
}

#[test]
fn publish_ships_a_new_package_version() {
    let stage = stage();
    let mut manager = AssetManager::load(stage.config.clone()).unwrap();
    let copy = edit_and_modify(&mut manager, &stage.released_library);

    let prepared = manager.prepare_publish(&copy, "Scatter fixes").unwrap();
    let released = ReleaseJob::new(manager.config(), prepared)
        .run()
        .unwrap()
        .expect("release should ship");

    assert_eq!(released.package_version, Version::new(1, 3, 0));
    assert!(released.library_path.is_dir());

    // The new version is loadable as a repository of its own.
    let mut config = stage.config.clone();
    config.repositories = vec![
        stage
            .tmp
            .path()
            .join("packages")
            .join(PACKAGE)
            .join("1.3.0"),
    ];
    config.edit_dir = stage.tmp.path().join("edit2");
    let reloaded = AssetManager::load(config).unwrap();
    let repo = reloaded.repo_from_namespace("rebellion.pipeline").unwrap();
    assert!(repo.node_type("rebellion.pipeline::Sop/scatter").is_some());
}

#[test]
fn shipped_changes_show_up_in_the_changelog() {
    let stage = stage();
    let mut manager = AssetManager::load(stage.config.clone()).unwrap();
    let copy = edit_and_modify(&mut manager, &stage.released_library);

    let prepared = manager.prepare_publish(&copy, "Scatter fixes").unwrap();
    ReleaseJob::new(manager.config(), prepared)
        .run()
        .unwrap()
        .expect("release should ship");

    let history_dir = stage.tmp.path().join("history");
    fs::create_dir_all(&history_dir).unwrap();
    let records = changelog::mine_history(
        &stage.config.asset_repo,
        &history_dir,
        PACKAGE,
        None,
        ASSET,
    )
    .unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].comment, "Add scatter");
    assert_eq!(records[1].comment, "Scatter fixes");
    assert!(records[1].python_diff.contains("do_work()"));
    assert_eq!(records[1].node_version.as_deref(), Some("1.2.0"));
}

#[test]
fn unchanged_working_copy_releases_nothing() {
    let stage = stage();
    let mut manager = AssetManager::load(stage.config.clone()).unwrap();
    let copy = manager.edit_definition(&stage.released_library).unwrap();
    // Match the origin's asset exactly.
    fs::write(
        copy.section_path("PythonModule"),
        "def run():\n    pass\n",
    )
    .unwrap();

    let prepared = manager
        .prepare_publish(copy.library_path(), "No-op")
        .unwrap();
    let released = ReleaseJob::new(manager.config(), prepared).run().unwrap();
    assert_eq!(released, None);
}
