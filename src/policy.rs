//! Keeps contributors from editing the version and changelog by hand.
//!
//! Only the automated publish commit may touch the protected files, and it
//! is recognisable because it touches nothing else.
use log::*;

use crate::{Result, error::ProteusError, repo::VersionControl};

/// Result of checking a diff against the protected files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyOutcome {
    /// No protected file was touched.
    Clean,
    /// Only protected files were touched: this is a publish commit.
    PublishCommit(Vec<String>),
    /// Protected files were changed alongside other files.
    Violation(Vec<String>),
}

/// Classify a list of changed paths.
pub fn check_diff(changed: &[String], protected: &[String]) -> PolicyOutcome {
    let (touched, others): (Vec<&String>, Vec<&String>) =
        changed.iter().partition(|file| protected.contains(file));

    let touched = touched.into_iter().cloned().collect::<Vec<String>>();

    if touched.is_empty() {
        PolicyOutcome::Clean
    } else if others.is_empty() {
        PolicyOutcome::PublishCommit(touched)
    } else {
        PolicyOutcome::Violation(touched)
    }
}

/// Message posted to the pull request when the policy is violated.
pub fn violation_message(protected: &[String]) -> String {
    format!(
        "Please do not include any changes to {} in your pull requests.",
        protected.join(" or ")
    )
}

/// Check the merge commit at `HEAD`.
///
/// The first parent of the merge is assumed to be the last upstream commit,
/// so the diff between it and the working tree is the pull request's change.
pub fn validate(
    vcs: &dyn VersionControl,
    protected: &[String],
) -> Result<PolicyOutcome> {
    let parents = vcs.head_parents()?;

    if parents.len() != 2 {
        return Err(ProteusError::UnexpectedCommitShape {
            parents: parents.len(),
        });
    }

    let upstream = &parents[0];
    let changed = vcs.changed_files_since(upstream)?;

    let outcome = check_diff(&changed, protected);

    match &outcome {
        PolicyOutcome::Clean => {
            debug!("no protected files changed since {upstream}")
        }
        PolicyOutcome::PublishCommit(files) => info!(
            "only {} changed: treating as a publish commit",
            files.join(", ")
        ),
        PolicyOutcome::Violation(files) => {
            warn!("pull request changes protected files: {}", files.join(", "))
        }
    }

    Ok(outcome)
}
