//! Client for a GitHub compatible forge REST API.
//!
//! Provides token-authenticated pull request lookup and comment posting
//! behind a trait so the workflow can run against a mock.

/// Connection configuration for the forge.
pub mod config;

/// GitHub and GitHub Enterprise REST client.
pub mod github;

/// Shared request and response types.
pub mod request;

/// Forge abstraction used by the workflow.
pub mod traits;
