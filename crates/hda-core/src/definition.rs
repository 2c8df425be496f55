//! Expanded definition libraries.
//!
//! An asset library on disk is an *expanded* definition directory named
//! `{Category}_{namespace}_{name}.hda`. Inside it, each definition is a
//! subdirectory holding an `INDEX__SECTION` file (rewritten on every publish,
//! carrying the `Operator:` line with the full type name) alongside section
//! files such as `PythonModule`. This module reads, renames and copies those
//! libraries; it is the standalone stand-in for the host application's
//! definition handles.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::ident::{self, TypeName};
use crate::{Error, Result};

/// Name of the index file inside a definition directory.
pub const INDEX_SECTION: &str = "INDEX__SECTION";

/// A single definition found inside an expanded library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Definition {
    library_path: PathBuf,
    definition_dir: PathBuf,
    type_name: TypeName,
    category: String,
}

impl Definition {
    /// The expanded library directory (`*.hda`) backing this definition.
    pub fn library_path(&self) -> &Path {
        &self.library_path
    }

    /// The definition subdirectory inside the library.
    pub fn definition_dir(&self) -> &Path {
        &self.definition_dir
    }

    /// The full `namespace::name::version` type name.
    pub fn type_name(&self) -> &TypeName {
        &self.type_name
    }

    /// The node-type category, taken from the library name prefix.
    pub fn category(&self) -> &str {
        &self.category
    }

    /// The registry index for this definition.
    pub fn index(&self) -> Option<String> {
        self.type_name.index(&self.category)
    }

    /// Path to a named section file, ie. `PythonModule`.
    pub fn section_path(&self, section: &str) -> PathBuf {
        self.definition_dir.join(section)
    }

    /// Rewrite the `Operator:` line so this definition carries a new type
    /// name. Used when an asset is renamed or re-versioned in place.
    pub fn set_type_name(&mut self, new_name: &TypeName) -> Result<()> {
        let index_path = self.definition_dir.join(INDEX_SECTION);
        let contents =
            fs::read_to_string(&index_path).map_err(|e| Error::io(&index_path, e))?;

        let mut replaced = false;
        let updated: Vec<String> = contents
            .lines()
            .map(|line| {
                if line.trim_start().starts_with("Operator:") {
                    replaced = true;
                    format!("Operator:       {new_name}")
                } else {
                    line.to_string()
                }
            })
            .collect();

        if !replaced {
            return Err(Error::invalid_library(
                &self.library_path,
                format!("no Operator line in {INDEX_SECTION}"),
            ));
        }

        fs::write(&index_path, updated.join("\n") + "\n")
            .map_err(|e| Error::io(&index_path, e))?;
        self.type_name = new_name.clone();
        debug!(name = %new_name, "Rewrote definition type name");
        Ok(())
    }

    /// Copy the whole library into `dest_dir` under `library_name`, optionally
    /// rewriting the type name of the copy. Returns the copied definition.
    ///
    /// An existing destination library is replaced.
    pub fn copy_to_library(
        &self,
        dest_dir: &Path,
        library_name: &str,
        new_name: Option<&TypeName>,
    ) -> Result<Definition> {
        let dest = dest_dir.join(library_name);
        if dest.exists() {
            fs::remove_dir_all(&dest).map_err(|e| Error::io(&dest, e))?;
        }
        copy_dir_recursive(&self.library_path, &dest)?;
        debug!(path = %dest.display(), "Definition saved");

        let mut copied = single_definition(&dest)?;
        if let Some(name) = new_name {
            copied.set_type_name(name)?;
        }
        Ok(copied)
    }
}

/// Enumerate every definition contained in an expanded library directory.
///
/// Subdirectories without an `INDEX__SECTION` are ignored; a library with no
/// definitions at all, or whose index carries no `Operator:` line, is an
/// error. The category comes from the library name prefix.
pub fn definitions_in_library(library_path: &Path) -> Result<Vec<Definition>> {
    let file_name = library_path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| Error::invalid_library(library_path, "unreadable library name"))?;

    let category = ident::category_from_library_name(file_name)
        .ok_or_else(|| {
            Error::invalid_library(
                library_path,
                "library name must follow Category_namespace_name.hda",
            )
        })?
        .to_string();

    if !library_path.is_dir() {
        return Err(Error::invalid_library(
            library_path,
            "expanded library is not a directory",
        ));
    }

    let mut definitions = Vec::new();
    let entries = fs::read_dir(library_path).map_err(|e| Error::io(library_path, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| Error::io(library_path, e))?;
        let dir = entry.path();
        if !dir.is_dir() {
            continue;
        }
        let index_path = dir.join(INDEX_SECTION);
        if !index_path.is_file() {
            continue;
        }

        let type_name = read_operator(&index_path)?.ok_or_else(|| {
            Error::invalid_library(library_path, format!("no Operator line in {INDEX_SECTION}"))
        })?;

        definitions.push(Definition {
            library_path: library_path.to_path_buf(),
            definition_dir: dir,
            type_name,
            category: category.clone(),
        });
    }

    if definitions.is_empty() {
        return Err(Error::invalid_library(
            library_path,
            "no definition directories found",
        ));
    }

    definitions.sort_by(|a, b| a.definition_dir.cmp(&b.definition_dir));
    Ok(definitions)
}

/// The library's single definition; errors when it holds none or several.
/// History mining and renames only make sense against exactly one.
pub fn single_definition(library_path: &Path) -> Result<Definition> {
    let mut definitions = definitions_in_library(library_path)?;
    if definitions.len() != 1 {
        return Err(Error::invalid_library(
            library_path,
            format!(
                "expected exactly one definition directory, found {}",
                definitions.len()
            ),
        ));
    }
    Ok(definitions.remove(0))
}

/// Extract the `Operator:` type name from an `INDEX__SECTION` file.
pub fn read_operator(index_path: &Path) -> Result<Option<TypeName>> {
    let contents = fs::read_to_string(index_path).map_err(|e| Error::io(index_path, e))?;
    Ok(operator_from_index(&contents))
}

/// Extract the `Operator:` type name from index-file contents.
pub fn operator_from_index(contents: &str) -> Option<TypeName> {
    contents.lines().find_map(|line| {
        let rest = line.trim_start().strip_prefix("Operator:")?;
        let value = rest.trim();
        if value.is_empty() {
            None
        } else {
            Some(TypeName::new(value))
        }
    })
}

fn copy_dir_recursive(src: &Path, dest: &Path) -> Result<()> {
    fs::create_dir_all(dest).map_err(|e| Error::io(dest, e))?;
    let entries = fs::read_dir(src).map_err(|e| Error::io(src, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| Error::io(src, e))?;
        let src_path = entry.path();
        let dest_path = dest.join(entry.file_name());
        if src_path.is_dir() {
            copy_dir_recursive(&src_path, &dest_path)?;
        } else {
            fs::copy(&src_path, &dest_path).map_err(|e| Error::io(&src_path, e))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hda_test_utils::library::write_library;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn reads_a_single_definition() {
        let tmp = TempDir::new().unwrap();
        let lib = write_library(
            tmp.path(),
            "Lop",
            "studio.pipeline::reference::1.0.0",
            "print('hello')",
        );

        let definition = single_definition(&lib).unwrap();
        assert_eq!(
            definition.type_name().as_str(),
            "studio.pipeline::reference::1.0.0"
        );
        assert_eq!(definition.category(), "Lop");
        assert_eq!(
            definition.index().as_deref(),
            Some("studio.pipeline::Lop/reference")
        );
        assert!(definition.section_path("PythonModule").is_file());
    }

    #[test]
    fn missing_operator_line_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let lib = tmp.path().join("Lop_studio.pipeline_broken.hda");
        fs::create_dir_all(lib.join("def")).unwrap();
        fs::write(lib.join("def").join(INDEX_SECTION), "Label:  Broken\n").unwrap();

        assert!(definitions_in_library(&lib).is_err());
    }

    #[test]
    fn empty_library_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let lib = tmp.path().join("Lop_studio.pipeline_empty.hda");
        fs::create_dir_all(&lib).unwrap();

        assert!(definitions_in_library(&lib).is_err());
    }

    #[test]
    fn bad_library_name_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let lib = tmp.path().join("noprefix.hda");
        fs::create_dir_all(&lib).unwrap();

        assert!(definitions_in_library(&lib).is_err());
    }

    #[test]
    fn rename_rewrites_the_operator_line() {
        let tmp = TempDir::new().unwrap();
        let lib = write_library(tmp.path(), "Lop", "studio.pipeline::reference::1.0.0", "");

        let mut definition = single_definition(&lib).unwrap();
        let renamed = TypeName::new("studio.fx::reference::2.0.0");
        definition.set_type_name(&renamed).unwrap();

        let reread = single_definition(&lib).unwrap();
        assert_eq!(reread.type_name(), &renamed);
    }

    #[test]
    fn copy_preserves_sections_and_can_rename() {
        let tmp = TempDir::new().unwrap();
        let lib = write_library(
            tmp.path(),
            "Lop",
            "studio.pipeline::reference::1.0.0",
            "print('module')",
        );
        let edit_dir = tmp.path().join("edit");
        fs::create_dir_all(&edit_dir).unwrap();

        let definition = single_definition(&lib).unwrap();
        let renamed = TypeName::new("studio.pipeline::reference::1.1.0");
        let copy = definition
            .copy_to_library(
                &edit_dir,
                "Lop_studio.pipeline_reference.123.hda",
                Some(&renamed),
            )
            .unwrap();

        assert_eq!(copy.type_name(), &renamed);
        let module = fs::read_to_string(copy.section_path("PythonModule")).unwrap();
        assert_eq!(module, "print('module')");
        // The source library is untouched.
        let original = single_definition(&lib).unwrap();
        assert_eq!(
            original.type_name().as_str(),
            "studio.pipeline::reference::1.0.0"
        );
    }
}
