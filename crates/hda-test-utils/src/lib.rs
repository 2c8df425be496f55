//! Shared test utilities for the hda-manager workspace.
//!
//! Provides standardised fixtures so crate test suites do not each grow their
//! own copies. Dev-dependency only — never published.
//!
//! # Modules
//!
//! - [`git`] — real git repositories with history, built via the `git` CLI
//! - [`library`] — expanded definition-library fixtures
//! - [`package`] — versioned package-tree fixtures

pub mod git;
pub mod library;
pub mod package;
