use chrono::{DateTime, FixedOffset};
use derive_builder::Builder;
use serde::Serialize;

/// Pull request metadata as returned by the forge.
#[derive(Debug, Clone, PartialEq, Eq, Builder)]
#[builder(setter(into))]
pub struct PullRequestDetails {
    pub number: u64,
    pub title: String,
    /// Raw markdown description; empty when the forge returns none
    #[builder(default)]
    pub body: String,
    pub created_at: DateTime<FixedOffset>,
    /// Collection URL that comments are posted to
    pub comments_url: String,
    /// Branch the pull request targets
    pub base_ref: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Request to post a comment on a pull request.
pub struct CommentRequest {
    pub pr_number: u64,
    pub comments_url: String,
    pub body: String,
}

#[derive(Debug, Serialize)]
/// JSON payload for a new comment
pub struct CommentBody<'a> {
    pub body: &'a str,
}
