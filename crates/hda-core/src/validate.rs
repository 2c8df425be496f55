//! Publish validation.
//!
//! Before a release starts, the working copy is pushed through a small check
//! chain. Every check runs — failures are collected into one report rather
//! than stopping at the first — and publishing proceeds only when all pass.

use tracing::debug;

use crate::definition::Definition;
use crate::manager::AssetManager;
use crate::{Error, Result};

/// Result of one publish check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOutcome {
    /// Short check name, ie. `namespace`.
    pub name: &'static str,
    /// Did the check pass?
    pub passed: bool,
    /// User-facing detail, set on failure.
    pub message: String,
}

impl CheckOutcome {
    fn pass(name: &'static str) -> Self {
        Self {
            name,
            passed: true,
            message: String::new(),
        }
    }

    fn fail(name: &'static str, message: String) -> Self {
        Self {
            name,
            passed: false,
            message,
        }
    }
}

/// The publish check chain.
pub struct PublishChecks;

impl PublishChecks {
    /// Evaluate every check against the definition.
    pub fn evaluate(manager: &AssetManager, def: &Definition) -> Vec<CheckOutcome> {
        vec![
            check_namespace(manager, def),
            check_latest_version(manager, def),
        ]
    }

    /// Evaluate and error with a combined report when any check fails.
    pub fn run(manager: &AssetManager, def: &Definition) -> Result<Vec<CheckOutcome>> {
        let outcomes = Self::evaluate(manager, def);
        let failures: Vec<&CheckOutcome> = outcomes.iter().filter(|o| !o.passed).collect();
        if failures.is_empty() {
            debug!(name = %def.type_name(), "Publish checks passed");
            return Ok(outcomes);
        }

        let report = failures
            .iter()
            .map(|o| format!("{}: {}", o.name, o.message))
            .collect::<Vec<_>>()
            .join("\n");
        Err(Error::ChecksFailed { report })
    }
}

/// The definition's namespace must be one the manager can publish into.
fn check_namespace(manager: &AssetManager, def: &Definition) -> CheckOutcome {
    let available = manager.all_available_namespaces();
    let valid = def
        .type_name()
        .namespace()
        .is_some_and(|ns| available.iter().any(|a| a == ns));
    if valid {
        CheckOutcome::pass("namespace")
    } else {
        CheckOutcome::fail(
            "namespace",
            format!(
                "invalid namespace for {}; should be one of: {}",
                def.type_name(),
                available.join(", ")
            ),
        )
    }
}

/// The definition must match or exceed the latest registered version.
fn check_latest_version(manager: &AssetManager, def: &Definition) -> CheckOutcome {
    if manager.is_latest_version(def) {
        CheckOutcome::pass("latest-version")
    } else {
        CheckOutcome::fail(
            "latest-version",
            format!(
                "{} is not the latest version; match or exceed the latest version before publishing",
                def.type_name()
            ),
        )
    }
}
