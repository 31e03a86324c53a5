//! Pull request identity and run mode.
//!
//! A run either validates an open pull request (the build was handed a PR
//! number) or publishes a merge to mainline (the PR number is read from the
//! merge commit message).
use chrono::{DateTime, FixedOffset};
use log::*;
use regex::Regex;
use std::sync::LazyLock;

use crate::{
    Result, error::ProteusError, forge::request::PullRequestDetails,
    repo::VersionControl,
};

/// Extracts the PR number from a forge generated merge commit message
static MERGE_MESSAGE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Merge pull request #(\d+) from").unwrap()
});

/// Matches level 1 and 2 markdown headings at the start of a line
static HEADING_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^(#{1,2}) ").unwrap());

/// How the current build was triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Build of an open pull request: only comment on it
    CommentOnly,
    /// Merge to mainline: update files, commit, tag and push
    Publish,
}

/// Which pull request this run is about, and why.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PullRequestRef {
    pub number: u64,
    pub mode: Mode,
}

impl PullRequestRef {
    pub fn is_open(&self) -> bool {
        self.mode == Mode::CommentOnly
    }
}

/// Resolve the run mode from an optional externally supplied PR number.
///
/// Without a number the last commit must be a forge merge commit; if it is
/// not, [`ProteusError::NoPullRequestFound`] signals that there is nothing
/// left to do.
pub fn resolve(
    pr_arg: Option<&str>,
    vcs: &dyn VersionControl,
) -> Result<PullRequestRef> {
    match pr_arg {
        Some(raw) => {
            let number = parse_number(raw).ok_or_else(|| {
                ProteusError::InvalidArgument(format!(
                    "{raw} isn't a valid PR number. Please check your build script."
                ))
            })?;
            info!("Pull request build detected. Using #{number} for change text");
            Ok(PullRequestRef {
                number,
                mode: Mode::CommentOnly,
            })
        }
        None => {
            let message = vcs.last_commit_message()?;
            let number = number_from_merge_message(&message)
                .ok_or(ProteusError::NoPullRequestFound)?;
            info!("Merge to mainline detected. Using #{number} for change text");
            Ok(PullRequestRef {
                number,
                mode: Mode::Publish,
            })
        }
    }
}

fn parse_number(raw: &str) -> Option<u64> {
    if raw.is_empty() || !raw.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    raw.parse::<u64>().ok().filter(|n| *n > 0)
}

/// PR number from a "Merge pull request #N from ..." message.
pub fn number_from_merge_message(message: &str) -> Option<u64> {
    MERGE_MESSAGE_REGEX
        .captures(message)
        .and_then(|caps| caps.get(1))
        .and_then(|m| parse_number(m.as_str()))
}

/// Demote `#` and `##` headings by two levels so a description cannot
/// open a new changelog entry or title.
pub fn demote_headings(body: &str) -> String {
    HEADING_REGEX.replace_all(body, "##$1 ").to_string()
}

/// Pull request metadata for a single run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequest {
    pub number: u64,
    pub is_open: bool,
    pub title: String,
    /// Description with headings demoted
    pub body: String,
    pub created_at: DateTime<FixedOffset>,
    pub comments_url: String,
    pub merge_target: String,
}

impl PullRequest {
    pub fn new(pr_ref: PullRequestRef, details: PullRequestDetails) -> Self {
        Self {
            number: pr_ref.number,
            is_open: pr_ref.is_open(),
            title: details.title,
            body: demote_headings(&details.body),
            created_at: details.created_at,
            comments_url: details.comments_url,
            merge_target: details.base_ref,
        }
    }

    pub fn targets(&self, branch: &str) -> bool {
        self.merge_target == branch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{forge::request::PullRequestDetailsBuilder, repo::MockVersionControl};

    #[test]
    fn supplied_number_is_comment_only() {
        let mut vcs = MockVersionControl::new();
        vcs.expect_last_commit_message().times(0);

        let pr = resolve(Some("123"), &vcs).unwrap();

        assert_eq!(pr.number, 123);
        assert_eq!(pr.mode, Mode::CommentOnly);
        assert!(pr.is_open());
    }

    #[test]
    fn supplied_number_must_be_numeric() {
        let vcs = MockVersionControl::new();
        for raw in ["", "12a", "-1", " 12", "#12", "0"] {
            let err = resolve(Some(raw), &vcs).unwrap_err();
            assert!(
                matches!(err, ProteusError::InvalidArgument(_)),
                "raw: {raw:?}"
            );
        }
    }

    #[test]
    fn merge_commit_selects_publish_mode() {
        let mut vcs = MockVersionControl::new();
        vcs.expect_last_commit_message().times(1).returning(|| {
            Ok("Merge pull request #57 from someone/feature-branch\n\nAdd thing"
                .into())
        });

        let pr = resolve(None, &vcs).unwrap();

        assert_eq!(pr.number, 57);
        assert_eq!(pr.mode, Mode::Publish);
    }

    #[test]
    fn non_merge_commit_means_nothing_to_do() {
        let mut vcs = MockVersionControl::new();
        vcs.expect_last_commit_message().returning(|| {
            Ok("Automated post-pull-request changelog and version commit".into())
        });

        let err = resolve(None, &vcs).unwrap_err();

        assert!(matches!(err, ProteusError::NoPullRequestFound));
    }

    #[test]
    fn demotes_top_level_headings_only() {
        let body = "# Title\n## Section\n### Deeper\ntext # not heading\n#NoSpace";
        assert_eq!(
            demote_headings(body),
            "### Title\n#### Section\n### Deeper\ntext # not heading\n#NoSpace"
        );
    }

    #[test]
    fn builds_pull_request_from_details() {
        let details = PullRequestDetailsBuilder::default()
            .number(9u64)
            .title("Add widgets")
            .body("## Summary\nnew feature")
            .created_at(
                DateTime::parse_from_rfc3339("2024-02-03T04:05:06Z").unwrap(),
            )
            .comments_url("https://git.example.com/api/v3/repos/o/r/issues/9/comments")
            .base_ref("master")
            .build()
            .unwrap();

        let pr = PullRequest::new(
            PullRequestRef {
                number: 9,
                mode: Mode::Publish,
            },
            details,
        );

        assert!(!pr.is_open);
        assert_eq!(pr.body, "#### Summary\nnew feature");
        assert!(pr.targets("master"));
        assert!(!pr.targets("develop"));
    }
}
