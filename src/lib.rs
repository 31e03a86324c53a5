//! Proteus bumps a project's VERSION and CHANGELOG.md from keywords in pull
//! request descriptions, and keeps contributors from editing either file by
//! hand.
//!
//! On a pull request build the change is classified and the result is posted
//! back as a comment. On a merge to mainline the new version is written,
//! committed, tagged and pushed.

/// Changelog entry rendering and merging.
pub mod changelog;

/// Keyword based change classification.
pub mod classifier;

/// Command line interface.
pub mod cli;

/// `proteus.toml` configuration.
pub mod config;

/// Error types.
pub mod error;

/// Forge API client.
pub mod forge;

/// Protected file policy.
pub mod policy;

/// Pull request resolution.
pub mod pull_request;

/// Local git repository operations.
pub mod repo;

/// Version file handling.
pub mod version;

/// Per-build pipeline.
pub mod workflow;

pub use error::{ProteusError, Result};
pub use workflow::{Outcome, Workflow};
