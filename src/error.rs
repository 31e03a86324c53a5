//! Error types for proteus.
use std::fmt;
use thiserror::Error;

/// Step of the publish chain that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishStep {
    Stage,
    Commit,
    Tag,
    PushBranch,
    PushTags,
}

impl fmt::Display for PublishStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PublishStep::Stage => "stage",
            PublishStep::Commit => "commit",
            PublishStep::Tag => "tag",
            PublishStep::PushBranch => "push-branch",
            PublishStep::PushTags => "push-tags",
        };
        write!(f, "{name}")
    }
}

/// Main error type for proteus operations.
#[derive(Error, Debug)]
pub enum ProteusError {
    // Cli args errors
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error(
        "No pull request number could be found in the last commit: this merge has probably already been processed"
    )]
    NoPullRequestFound,

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // Forge errors
    #[error(
        "The forge token does not have access to read pull requests in the {owner}/{repo} repository"
    )]
    Unauthorized { owner: String, repo: String },

    #[error("{}", forge_error_message(.status, .message, .url))]
    ForgeError {
        status: Option<u16>,
        message: String,
        url: String,
    },

    #[error(
        "Could not post a comment to pull request {owner}/{repo}#{pr_number} ({reason}): {text}"
    )]
    CommentPostFailed {
        owner: String,
        repo: String,
        pr_number: u64,
        reason: String,
        text: String,
    },

    // Repository state errors
    #[error(
        "The most recent commit has {parents} parent(s) instead of being a merge: the build process is not behaving as expected"
    )]
    UnexpectedCommitShape { parents: usize },

    #[error("{message} (changed: {})", .files.join(", "))]
    PolicyViolation { message: String, files: Vec<String> },

    #[error("{help}")]
    NoChangeKeyword { help: String },

    #[error(
        "Version {version} cannot be bumped: a component is already at its maximum"
    )]
    VersionOverflow { version: String },

    #[error("Publishing failed at step '{step}': {message}")]
    PublishFailed { step: PublishStep, message: String },

    // Wrapped third-party errors
    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParseError(#[from] toml::de::Error),

    #[error("Datetime parse error: {0}")]
    ChronoParseError(#[from] chrono::ParseError),

    #[error("Regular expression error: {0}")]
    RegexError(#[from] regex::Error),

    #[error("URL parse error: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("Git URL parse error: {0}")]
    GitUrlError(#[from] git_url_parse::GitUrlParseError),
}

fn forge_error_message(status: &Option<u16>, message: &str, url: &str) -> String {
    match status {
        Some(code) => format!("Forge responded with a {code}: {message} ({url})"),
        None => format!("Forge request failed: {message} ({url})"),
    }
}

/// Result type alias using ProteusError
pub type Result<T> = std::result::Result<T, ProteusError>;

impl ProteusError {
    /// Create an invalid config error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a publish error for the given step
    pub fn publish(step: PublishStep, err: impl fmt::Display) -> Self {
        Self::PublishFailed {
            step,
            message: err.to_string(),
        }
    }
}

// A 401 on a read is mapped to Unauthorized by the client instead.
impl From<reqwest::Error> for ProteusError {
    fn from(err: reqwest::Error) -> Self {
        let url = err.url().map(|u| u.to_string()).unwrap_or_default();
        let message = if err.is_timeout() {
            format!("request timed out: {err}")
        } else {
            err.to_string()
        };
        Self::ForgeError {
            status: err.status().map(|s| s.as_u16()),
            message,
            url,
        }
    }
}

impl From<reqwest::header::InvalidHeaderValue> for ProteusError {
    fn from(err: reqwest::header::InvalidHeaderValue) -> Self {
        Self::InvalidConfig(format!("Invalid token header value: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forge_error_includes_status_and_url() {
        let err = ProteusError::ForgeError {
            status: Some(404),
            message: "Not Found".into(),
            url: "https://api.example.com/repos/o/r/pulls/1".into(),
        };
        assert_eq!(
            err.to_string(),
            "Forge responded with a 404: Not Found (https://api.example.com/repos/o/r/pulls/1)"
        );
    }

    #[test]
    fn policy_violation_lists_files() {
        let err = ProteusError::PolicyViolation {
            message: "Please do not".into(),
            files: vec!["CHANGELOG.md".into(), "src/lib.rs".into()],
        };
        assert_eq!(
            err.to_string(),
            "Please do not (changed: CHANGELOG.md, src/lib.rs)"
        );
    }

    #[test]
    fn publish_step_names() {
        let err = ProteusError::publish(PublishStep::PushTags, "rejected");
        assert_eq!(
            err.to_string(),
            "Publishing failed at step 'push-tags': rejected"
        );
    }
}
