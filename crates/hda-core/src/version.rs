//! Semantic version handling for node types and packages.
//!
//! Versions follow `major.minor.patch`. Definitions without a version
//! component in their type name are still tracked, under an explicit
//! unversioned bucket that always sorts below every real version.

use semver::Version;

use crate::{Error, Result};

/// Registry key for a node-type version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VersionKey {
    /// Definitions whose type name carries no version component.
    Unversioned,
    /// A parsed `major.minor.patch` version.
    Semver(Version),
}

impl VersionKey {
    /// Build a key from an optional version string.
    pub fn parse(version: Option<&str>) -> Result<Self> {
        match version {
            None => Ok(Self::Unversioned),
            Some(v) => Ok(Self::Semver(parse_version(v)?)),
        }
    }

    /// The parsed version, when one exists.
    pub fn as_version(&self) -> Option<&Version> {
        match self {
            Self::Unversioned => None,
            Self::Semver(v) => Some(v),
        }
    }
}

impl std::fmt::Display for VersionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unversioned => write!(f, "no version"),
            Self::Semver(v) => write!(f, "{v}"),
        }
    }
}

/// Parse a version string leniently.
///
/// Accepts `1`, `1.2` and `1.2.3`, padding missing components with zeros.
/// Anything non-numeric is rejected.
pub fn parse_version(version: &str) -> Result<Version> {
    let invalid = |message: &str| Error::InvalidVersion {
        version: version.to_string(),
        message: message.to_string(),
    };

    let parts: Vec<&str> = version.split('.').collect();
    if parts.is_empty() || parts.len() > 3 {
        return Err(invalid("expected major[.minor[.patch]]"));
    }

    let mut numbers = [0u64; 3];
    for (i, part) in parts.iter().enumerate() {
        numbers[i] = part
            .parse::<u64>()
            .map_err(|_| invalid("components must be numeric"))?;
    }

    Ok(Version::new(numbers[0], numbers[1], numbers[2]))
}

/// Which component to increment when cutting a new version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bump {
    Major,
    Minor,
    Patch,
}

/// Increment the given component, zeroing everything below it.
pub fn bump(version: &Version, bump: Bump) -> Version {
    match bump {
        Bump::Major => Version::new(version.major + 1, 0, 0),
        Bump::Minor => Version::new(version.major, version.minor + 1, 0),
        Bump::Patch => Version::new(version.major, version.minor, version.patch + 1),
    }
}

/// The first version of a brand new node type.
pub fn initial_version() -> Version {
    Version::new(1, 0, 0)
}

/// One entry of the configure version selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionChoice {
    /// Keep the current version.
    NoChange(Version),
    /// Increment the major component.
    IncrementMajor(Version),
    /// Increment the minor component.
    IncrementMinor(Version),
    /// Increment the patch component.
    IncrementPatch(Version),
    /// First version of a type that does not exist yet.
    Initial(Version),
}

impl VersionChoice {
    /// The version this choice resolves to.
    pub fn version(&self) -> &Version {
        match self {
            Self::NoChange(v)
            | Self::IncrementMajor(v)
            | Self::IncrementMinor(v)
            | Self::IncrementPatch(v)
            | Self::Initial(v) => v,
        }
    }

    /// Human-readable label, as shown in the selector.
    pub fn label(&self) -> String {
        match self {
            Self::NoChange(v) => format!("No change ({v})"),
            Self::IncrementMajor(v) => format!("Increment Major ({v})"),
            Self::IncrementMinor(v) => format!("Increment Minor ({v})"),
            Self::IncrementPatch(v) => format!("Increment Patch ({v})"),
            Self::Initial(v) => format!("Initial Version ({v})"),
        }
    }
}

/// Build the version selector for a type.
///
/// For an existing type: no change plus the three increments against the
/// current latest version. For an unknown type: only the initial version.
pub fn version_choices(current: Option<&Version>) -> Vec<VersionChoice> {
    match current {
        Some(v) => vec![
            VersionChoice::NoChange(v.clone()),
            VersionChoice::IncrementMajor(bump(v, Bump::Major)),
            VersionChoice::IncrementMinor(bump(v, Bump::Minor)),
            VersionChoice::IncrementPatch(bump(v, Bump::Patch)),
        ],
        None => vec![VersionChoice::Initial(initial_version())],
    }
}

/// Resolve a bump request against the current latest version, the way the
/// configure flow does: no current version always means `1.0.0`.
pub fn resolve_bump(current: Option<&Version>, request: Option<Bump>) -> Version {
    match (current, request) {
        (None, _) => initial_version(),
        (Some(v), None) => v.clone(),
        (Some(v), Some(b)) => bump(v, b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("1", Version::new(1, 0, 0))]
    #[case("1.2", Version::new(1, 2, 0))]
    #[case("1.2.3", Version::new(1, 2, 3))]
    fn lenient_parse_pads_missing_components(#[case] input: &str, #[case] expected: Version) {
        assert_eq!(parse_version(input).unwrap(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("1.2.3.4")]
    #[case("1.x")]
    #[case("v1.0.0")]
    fn bad_versions_are_rejected(#[case] input: &str) {
        assert!(parse_version(input).is_err());
    }

    #[test]
    fn unversioned_sorts_below_everything() {
        let none = VersionKey::Unversioned;
        let some = VersionKey::Semver(Version::new(0, 0, 1));
        assert!(none < some);
    }

    #[test]
    fn keys_order_by_semver() {
        let a = VersionKey::parse(Some("1.9.0")).unwrap();
        let b = VersionKey::parse(Some("1.10.0")).unwrap();
        assert!(a < b);
    }

    #[test]
    fn bumps_zero_lower_components() {
        let v = Version::new(1, 2, 3);
        assert_eq!(bump(&v, Bump::Major), Version::new(2, 0, 0));
        assert_eq!(bump(&v, Bump::Minor), Version::new(1, 3, 0));
        assert_eq!(bump(&v, Bump::Patch), Version::new(1, 2, 4));
    }

    #[test]
    fn selector_for_existing_type_offers_four_choices() {
        let current = Version::new(1, 2, 3);
        let choices = version_choices(Some(&current));
        let labels: Vec<String> = choices.iter().map(|c| c.label()).collect();
        assert_eq!(
            labels,
            vec![
                "No change (1.2.3)",
                "Increment Major (2.0.0)",
                "Increment Minor (1.3.0)",
                "Increment Patch (1.2.4)",
            ]
        );
    }

    #[test]
    fn selector_for_new_type_offers_initial_only() {
        let choices = version_choices(None);
        assert_eq!(choices, vec![VersionChoice::Initial(Version::new(1, 0, 0))]);
    }

    #[test]
    fn resolve_bump_defaults() {
        assert_eq!(resolve_bump(None, Some(Bump::Major)), Version::new(1, 0, 0));
        let current = Version::new(2, 1, 0);
        assert_eq!(resolve_bump(Some(&current), None), current);
        assert_eq!(
            resolve_bump(Some(&current), Some(Bump::Patch)),
            Version::new(2, 1, 1)
        );
    }
}
