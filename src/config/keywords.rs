use derive_builder::Builder;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Keyword phrases that classify a pull request description. Phrases are
/// matched case-insensitively anywhere in the body.
#[derive(
    Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Builder,
)]
#[builder(setter(into), default)]
#[serde(default)]
pub struct KeywordConfig {
    /// Phrases that signal a breaking change
    pub major: Vec<String>,
    /// Phrases that signal a new feature
    pub minor: Vec<String>,
    /// Phrases that signal a fix or small improvement
    pub patch: Vec<String>,
    /// Bump the major version for breaking changes even while the major
    /// version is still 0 (default: false, 0.y.z breaking changes bump minor)
    pub breaking_always_increment_major: bool,
}

impl Default for KeywordConfig {
    fn default() -> Self {
        Self {
            major: vec!["breaking change".into()],
            minor: vec!["new feature".into()],
            patch: vec![
                "bug fix".into(),
                "bugfix".into(),
                "patch".into(),
                "improvement".into(),
            ],
            breaking_always_increment_major: false,
        }
    }
}
