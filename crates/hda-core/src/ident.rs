//! Node type naming.
//!
//! Digital-asset type names follow the `namespace::name::version` convention.
//! A name is valid when it carries at least three `::`-separated components;
//! the namespace, name and version are always the last three. Registry lookup
//! keys additionally fold in the node-type category as
//! `namespace::category/name`.

use chrono::{DateTime, Utc};

use crate::{Error, Result};

/// A node type name in `namespace::name::version` form.
///
/// Wraps the raw string so that invalid names (missing namespace or version)
/// can still be carried around and reported, mirroring how unversioned
/// definitions show up in the wild.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeName {
    raw: String,
}

impl TypeName {
    /// Wrap a raw type name. No validation happens here; use
    /// [`TypeName::is_valid`] or the accessors to interrogate it.
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }

    /// Build a type name from its three components.
    pub fn from_components(namespace: &str, name: &str, version: &str) -> Self {
        Self {
            raw: format!("{namespace}::{name}::{version}"),
        }
    }

    /// The raw `namespace::name::version` string.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    fn components(&self) -> Vec<&str> {
        self.raw.split("::").collect()
    }

    /// A name is valid when it has at least namespace, name and version.
    pub fn is_valid(&self) -> bool {
        self.components().len() >= 3
    }

    /// The namespace component, when the name is valid.
    pub fn namespace(&self) -> Option<&str> {
        let parts = self.components();
        if parts.len() >= 3 {
            Some(parts[parts.len() - 3])
        } else {
            None
        }
    }

    /// The name component. Invalid type names fall back to the whole string,
    /// so there is always something to display.
    pub fn name(&self) -> &str {
        let parts = self.components();
        if parts.len() >= 3 {
            parts[parts.len() - 2]
        } else {
            &self.raw
        }
    }

    /// The version component, when the name is valid.
    pub fn version(&self) -> Option<&str> {
        let parts = self.components();
        if parts.len() >= 3 {
            Some(parts[parts.len() - 1])
        } else {
            None
        }
    }

    /// The registry index for this type: `namespace::category/name`.
    ///
    /// Leading components beyond the last three are preserved, the version is
    /// dropped. Returns `None` for invalid names.
    pub fn index(&self, category: &str) -> Option<String> {
        if !self.is_valid() {
            return None;
        }
        let parts = self.components();
        let mut indexed: Vec<String> = parts[..parts.len() - 1]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let last = indexed.len() - 1;
        indexed[last] = format!("{category}/{}", indexed[last]);
        Some(indexed.join("::"))
    }

    /// Rebuild the type name with any component overridden.
    ///
    /// Components not overridden are taken from this name; errors when a
    /// component is neither overridden nor present.
    pub fn with_overrides(
        &self,
        namespace: Option<&str>,
        name: Option<&str>,
        version: Option<&str>,
    ) -> Result<TypeName> {
        let namespace = match namespace.or_else(|| self.namespace()) {
            Some(ns) => ns,
            None => {
                return Err(Error::InvalidTypeName {
                    name: self.raw.clone(),
                });
            }
        };
        let name = name.unwrap_or_else(|| self.name());
        let version = match version.or_else(|| self.version()) {
            Some(v) => v,
            None => {
                return Err(Error::InvalidTypeName {
                    name: self.raw.clone(),
                });
            }
        };
        Ok(TypeName::from_components(namespace, name, version))
    }
}

impl std::fmt::Display for TypeName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.raw)
    }
}

impl From<&str> for TypeName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// The registry index built directly from components.
pub fn index_from_components(namespace: &str, name: &str, category: &str) -> String {
    format!("{namespace}::{category}/{name}")
}

/// The directory name a definition expands to:
/// `{category}_{namespace}_{name}.hda`, ie. `Lop_studio.pipeline_reference.hda`.
pub fn expanded_library_name(category: &str, type_name: &TypeName) -> String {
    match type_name.namespace() {
        Some(namespace) => {
            format!("{category}_{namespace}_{}.hda", type_name.name())
        }
        // Invalid names just make do with whatever we have.
        None => format!("{category}_{}.hda", type_name.name()),
    }
}

/// The file name used for a working copy in the edit directory. Stamped with
/// a microsecond timestamp so repeated edits never collide:
/// `{category}_{namespace}_{name}.{ts}.hda`.
pub fn editable_library_name(category: &str, type_name: &TypeName, now: DateTime<Utc>) -> String {
    let full_name = match type_name.namespace() {
        Some(namespace) => format!("{namespace}_{}", type_name.name()),
        None => type_name.as_str().to_string(),
    };
    format!("{category}_{full_name}.{}.hda", now.timestamp_micros())
}

/// Category prefix of an expanded library name, ie. `Lop` for
/// `Lop_studio.pipeline_reference.hda`.
pub fn category_from_library_name(file_name: &str) -> Option<&str> {
    let stem = file_name.strip_suffix(".hda")?;
    let (category, rest) = stem.split_once('_')?;
    if category.is_empty() || rest.is_empty() {
        return None;
    }
    Some(category)
}

/// A legal git branch name for releasing the given definition:
/// `release_{category}-{namespace}-{name}-{version}-{dd-mm-yy-HH-MM-SS}`.
pub fn release_branch_name(category: &str, type_name: &TypeName, now: DateTime<Utc>) -> String {
    format!(
        "release_{category}-{namespace}-{name}-{version}-{time}",
        namespace = type_name.namespace().unwrap_or("none"),
        name = type_name.name(),
        version = type_name.version().unwrap_or("none"),
        time = now.format("%d-%m-%y-%H-%M-%S"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_three_part_names() {
        let name = TypeName::new("studio.pipeline::reference::1.2.3");
        assert!(name.is_valid());
        assert_eq!(name.namespace(), Some("studio.pipeline"));
        assert_eq!(name.name(), "reference");
        assert_eq!(name.version(), Some("1.2.3"));
    }

    #[test]
    fn short_names_are_invalid_but_usable() {
        let name = TypeName::new("reference");
        assert!(!name.is_valid());
        assert_eq!(name.namespace(), None);
        assert_eq!(name.name(), "reference");
        assert_eq!(name.version(), None);
    }

    #[test]
    fn index_folds_in_category() {
        let name = TypeName::new("studio.pipeline::reference::1.2.3");
        assert_eq!(
            name.index("Lop").as_deref(),
            Some("studio.pipeline::Lop/reference")
        );
    }

    #[test]
    fn index_preserves_leading_components() {
        let name = TypeName::new("extra::studio.pipeline::reference::1.2.3");
        assert_eq!(
            name.index("Sop").as_deref(),
            Some("extra::studio.pipeline::Sop/reference")
        );
    }

    #[test]
    fn index_of_invalid_name_is_none() {
        assert_eq!(TypeName::new("reference::1.0.0").index("Sop"), None);
    }

    #[test]
    fn overrides_replace_single_components() {
        let name = TypeName::new("studio.pipeline::reference::1.2.3");
        let renamed = name.with_overrides(None, Some("lookdev"), None).unwrap();
        assert_eq!(renamed.as_str(), "studio.pipeline::lookdev::1.2.3");

        let bumped = name.with_overrides(None, None, Some("2.0.0")).unwrap();
        assert_eq!(bumped.as_str(), "studio.pipeline::reference::2.0.0");
    }

    #[test]
    fn overrides_on_invalid_name_need_all_parts() {
        let name = TypeName::new("reference");
        assert!(name.with_overrides(None, None, Some("1.0.0")).is_err());
        let fixed = name
            .with_overrides(Some("studio.fx"), None, Some("1.0.0"))
            .unwrap();
        assert_eq!(fixed.as_str(), "studio.fx::reference::1.0.0");
    }

    #[test]
    fn expanded_and_editable_names() {
        let name = TypeName::new("studio.pipeline::reference::1.2.3");
        assert_eq!(
            expanded_library_name("Lop", &name),
            "Lop_studio.pipeline_reference.hda"
        );
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        assert_eq!(
            editable_library_name("Lop", &name, now),
            format!(
                "Lop_studio.pipeline_reference.{}.hda",
                now.timestamp_micros()
            )
        );
    }

    #[test]
    fn category_comes_from_the_file_name_prefix() {
        assert_eq!(
            category_from_library_name("Lop_studio.pipeline_reference.hda"),
            Some("Lop")
        );
        assert_eq!(category_from_library_name("noprefix.hda"), None);
        assert_eq!(category_from_library_name("Lop_thing.txt"), None);
    }

    #[test]
    fn release_branch_is_stamped() {
        let name = TypeName::new("studio.pipeline::reference::1.2.3");
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 13, 45, 9).unwrap();
        assert_eq!(
            release_branch_name("Lop", &name, now),
            "release_Lop-studio.pipeline-reference-1.2.3-01-05-24-13-45-09"
        );
    }
}
