//! Configuration loading and parsing for `proteus.toml` files.
//!
//! Every field has a default, so a repository without a config file gets
//! the stock VERSION / CHANGELOG.md behaviour on `master`.
use log::*;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::{fs, io::ErrorKind, path::Path};

use crate::{Result, error::ProteusError};

pub mod forge;
pub mod keywords;

use self::{forge::ForgeConfig, keywords::KeywordConfig};

/// Default configuration filename.
pub const DEFAULT_CONFIG_FILE: &str = "proteus.toml";
/// Default mainline branch releases are cut from.
pub const DEFAULT_MAINLINE_BRANCH: &str = "master";
pub const DEFAULT_VERSION_FILE: &str = "VERSION";
pub const DEFAULT_CHANGELOG_FILE: &str = "CHANGELOG.md";
pub const DEFAULT_TAG_PREFIX: &str = "v";
pub const DEFAULT_REMOTE: &str = "origin";
pub const DEFAULT_COMMIT_MESSAGE: &str =
    "Automated post-pull-request changelog and version commit";
/// Build parameter the new version is published under.
pub const DEFAULT_CI_VERSION_PARAMETER: &str = "bbb.version";

const DEFAULT_FAIL_IMAGES: &[&str] = &[
    "http://media.giphy.com/media/njYrp176NQsHS/giphy.gif",
    "http://media0.giphy.com/media/aUrv4ohm0IPNS/giphy.gif",
    "http://media.giphy.com/media/bR4fRofHcFVy8/giphy.gif",
    "http://media.giphy.com/media/QMJhOD0obsiPe/giphy.gif",
    "http://media.giphy.com/media/14aUO0Mf7dWDXW/giphy.gif",
    "http://media.giphy.com/media/rXMkGj2Z3iKGs/giphy.gif",
    "http://media1.giphy.com/media/YzZ29cRg4hkrK/giphy.gif",
    "http://media1.giphy.com/media/gLrWjmW6XljZC/giphy.gif",
    "http://media.giphy.com/media/1014RBn4HVSTK/giphy.gif",
];

/// Root configuration structure for `proteus.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Config {
    /// Branch that merged pull requests are published to
    pub mainline_branch: String,
    /// Do nothing for pull requests that target another branch
    pub skip_non_mainline_targets: bool,
    /// Version file, relative to the repository root
    pub version_file: String,
    /// Changelog file, relative to the repository root
    pub changelog_file: String,
    /// Prefix for release tags (e.g. "v" gives "v1.2.3")
    pub tag_prefix: String,
    /// Message of the automated publish commit
    pub commit_message: String,
    /// Remote that the publish commit and tag are pushed to
    pub remote: String,
    /// CI build parameter to report the new version under. Empty disables.
    pub ci_version_parameter: String,
    /// Images appended to failure comments
    pub fail_images: Vec<String>,
    /// Forge HTTP settings
    pub forge: ForgeConfig,
    /// Change type keywords
    pub keywords: KeywordConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mainline_branch: DEFAULT_MAINLINE_BRANCH.into(),
            skip_non_mainline_targets: false,
            version_file: DEFAULT_VERSION_FILE.into(),
            changelog_file: DEFAULT_CHANGELOG_FILE.into(),
            tag_prefix: DEFAULT_TAG_PREFIX.into(),
            commit_message: DEFAULT_COMMIT_MESSAGE.into(),
            remote: DEFAULT_REMOTE.into(),
            ci_version_parameter: DEFAULT_CI_VERSION_PARAMETER.into(),
            fail_images: DEFAULT_FAIL_IMAGES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            forge: ForgeConfig::default(),
            keywords: KeywordConfig::default(),
        }
    }
}

impl Config {
    /// Load config from `path`, falling back to defaults when the file
    /// does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        let config = match fs::read_to_string(path) {
            Ok(content) => {
                debug!("loading configuration from {}", path.display());
                toml::from_str::<Config>(&content)?
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!("repository configuration not found: using default");
                Config::default()
            }
            Err(err) => return Err(err.into()),
        };

        config.validate()?;

        Ok(config)
    }

    /// Files that only the publish step may modify.
    pub fn protected_files(&self) -> Vec<String> {
        vec![self.changelog_file.clone(), self.version_file.clone()]
    }

    fn validate(&self) -> Result<()> {
        if self.version_file.trim().is_empty()
            || self.changelog_file.trim().is_empty()
        {
            return Err(ProteusError::invalid_config(
                "version_file and changelog_file must not be empty",
            ));
        }

        if self.version_file == self.changelog_file {
            return Err(ProteusError::invalid_config(
                "version_file and changelog_file must be different files",
            ));
        }

        if self.mainline_branch.trim().is_empty() {
            return Err(ProteusError::invalid_config(
                "mainline_branch must not be empty",
            ));
        }

        let keywords = &self.keywords;
        if keywords
            .major
            .iter()
            .chain(&keywords.minor)
            .chain(&keywords.patch)
            .any(|k| k.trim().is_empty())
        {
            return Err(ProteusError::invalid_config(
                "keyword phrases must not be empty",
            ));
        }

        if keywords.major.is_empty()
            && keywords.minor.is_empty()
            && keywords.patch.is_empty()
        {
            return Err(ProteusError::invalid_config(
                "at least one change type keyword must be configured",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn loads_defaults_when_missing() {
        let dir = TempDir::new().unwrap();
        let config = Config::load(&dir.path().join(DEFAULT_CONFIG_FILE))
            .unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.protected_files(), vec!["CHANGELOG.md", "VERSION"]);
        assert!(config.forge.accept_invalid_certs);
        assert_eq!(config.forge.request_timeout_secs, 30);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        fs::write(
            &path,
            r#"
mainline_branch = "main"
skip_non_mainline_targets = true

[forge]
accept_invalid_certs = false

[keywords]
patch = ["fix"]
"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.mainline_branch, "main");
        assert!(config.skip_non_mainline_targets);
        assert!(!config.forge.accept_invalid_certs);
        assert_eq!(config.forge.request_timeout_secs, 30);
        assert_eq!(config.keywords.patch, vec!["fix"]);
        assert_eq!(config.keywords.minor, vec!["new feature"]);
        assert_eq!(config.version_file, "VERSION");
    }

    #[test]
    fn rejects_empty_keyword() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        fs::write(&path, "[keywords]\nminor = [\"\"]\n").unwrap();
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ProteusError::InvalidConfig(_)));
    }

    #[test]
    fn rejects_same_protected_file_twice() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        fs::write(&path, "version_file = \"CHANGELOG.md\"\n").unwrap();
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ProteusError::InvalidConfig(_)));
    }

    #[test]
    fn malformed_toml_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        fs::write(&path, "mainline_branch = [").unwrap();
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ProteusError::TomlParseError(_)));
    }
}
