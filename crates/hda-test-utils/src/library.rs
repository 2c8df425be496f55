//! Expanded definition-library fixtures.
//!
//! An expanded library is a `{Category}_{namespace}_{name}.hda` directory
//! holding one definition subdirectory with an `INDEX__SECTION` and a
//! `PythonModule` section. These helpers build the minimal valid shape.

use std::fs;
use std::path::{Path, PathBuf};

/// Writes an expanded library under `dir` for the given type name.
///
/// The library name is derived from the category and the type-name
/// components: `{category}_{namespace}_{name}.hda`.
///
/// # Panics
/// Panics on filesystem failure or on a type name with fewer than three
/// `::`-separated components.
pub fn write_library(dir: &Path, category: &str, type_name: &str, python_module: &str) -> PathBuf {
    let parts: Vec<&str> = type_name.split("::").collect();
    assert!(
        parts.len() >= 3,
        "write_library: type name must be namespace::name::version, got {type_name}"
    );
    let namespace = parts[parts.len() - 3];
    let name = parts[parts.len() - 2];
    let library_name = format!("{category}_{namespace}_{name}.hda");
    write_library_named(dir, &library_name, type_name, python_module)
}

/// Writes an expanded library under `dir` with an explicit library name.
///
/// Use when the library name must diverge from the type name (timestamped
/// editable copies, malformed fixtures).
///
/// # Panics
/// Panics on filesystem failure.
pub fn write_library_named(
    dir: &Path,
    library_name: &str,
    type_name: &str,
    python_module: &str,
) -> PathBuf {
    let library = dir.join(library_name);
    let definition_dir = library.join(type_name.replace("::", "__").replace('.', "_"));
    fs::create_dir_all(&definition_dir)
        .unwrap_or_else(|e| panic!("write_library: failed to create {library_name}: {e}"));

    let index = format!(
        "Operator:       {type_name}\nLabel:  {label}\nPath:   oplib:/{type_name}\n",
        label = type_name.rsplit("::").nth(1).unwrap_or(type_name),
    );
    fs::write(definition_dir.join("INDEX__SECTION"), index)
        .unwrap_or_else(|e| panic!("write_library: failed to write INDEX__SECTION: {e}"));
    fs::write(definition_dir.join("PythonModule"), python_module)
        .unwrap_or_else(|e| panic!("write_library: failed to write PythonModule: {e}"));

    library
}
