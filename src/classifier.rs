//! Infers the size of a change from keywords in the pull request description
//! and computes the next version.
//!
//! Rules are held in a fixed precedence table (major, minor, patch) and the
//! first rule with a matching phrase wins. A breaking change in a `0.y.z`
//! project is treated as feature work and only bumps the minor version,
//! unless `breaking_always_increment_major` is set.
use log::*;
use regex::{Regex, RegexBuilder};
use semver::Version;
use std::fmt;

use crate::{Result, config::keywords::KeywordConfig, error::ProteusError};

const NO_KEYWORD_PREAMBLE: &str = "The pull request description didn't contain any keywords indicating what kind of change this is. Please include a keyword from this list to allow this pull request to be accepted:";

/// Size of a change derived from keyword matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeClass {
    Major,
    Minor,
    Patch,
    Unknown,
}

impl ChangeClass {
    /// Human readable result posted back to the pull request.
    pub fn description(&self) -> &'static str {
        match self {
            ChangeClass::Major => "Major version change detected.",
            ChangeClass::Minor => "Minor version change detected.",
            ChangeClass::Patch => "Patch version change detected.",
            ChangeClass::Unknown => "No version change keyword detected.",
        }
    }

    /// Apply the bump to `current`. `Unknown` leaves it untouched.
    pub fn bump(&self, current: &Version) -> Result<Version> {
        let overflow = || ProteusError::VersionOverflow {
            version: current.to_string(),
        };
        let next = match self {
            ChangeClass::Major => Version::new(
                current.major.checked_add(1).ok_or_else(overflow)?,
                0,
                0,
            ),
            ChangeClass::Minor => Version::new(
                current.major,
                current.minor.checked_add(1).ok_or_else(overflow)?,
                0,
            ),
            ChangeClass::Patch => Version::new(
                current.major,
                current.minor,
                current.patch.checked_add(1).ok_or_else(overflow)?,
            ),
            ChangeClass::Unknown => current.clone(),
        };
        Ok(next)
    }
}

impl fmt::Display for ChangeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChangeClass::Major => "Major",
            ChangeClass::Minor => "Minor",
            ChangeClass::Patch => "Patch",
            ChangeClass::Unknown => "Unknown",
        };
        write!(f, "{name}")
    }
}

/// Result of a successful classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub class: ChangeClass,
    pub current: Version,
    pub next: Version,
}

impl Classification {
    pub fn description(&self) -> &'static str {
        self.class.description()
    }
}

#[derive(Debug)]
struct KeywordRule {
    class: ChangeClass,
    phrases: Vec<String>,
    regex: Regex,
}

impl KeywordRule {
    fn new(class: ChangeClass, phrases: &[String]) -> Result<Option<Self>> {
        if phrases.is_empty() {
            return Ok(None);
        }

        let pattern = phrases
            .iter()
            .map(|p| regex::escape(p.trim()))
            .collect::<Vec<String>>()
            .join("|");

        let regex = RegexBuilder::new(&pattern).case_insensitive(true).build()?;

        Ok(Some(Self {
            class,
            phrases: phrases.to_vec(),
            regex,
        }))
    }
}

/// Keyword driven change classifier.
#[derive(Debug)]
pub struct Classifier {
    rules: Vec<KeywordRule>,
    breaking_always_increment_major: bool,
}

impl Classifier {
    pub fn new(config: &KeywordConfig) -> Result<Self> {
        let rules = [
            KeywordRule::new(ChangeClass::Major, &config.major)?,
            KeywordRule::new(ChangeClass::Minor, &config.minor)?,
            KeywordRule::new(ChangeClass::Patch, &config.patch)?,
        ]
        .into_iter()
        .flatten()
        .collect();

        Ok(Self {
            rules,
            breaking_always_increment_major: config
                .breaking_always_increment_major,
        })
    }

    /// Class of the first rule whose phrases appear in `body`.
    pub fn matched_class(&self, body: &str) -> ChangeClass {
        self.rules
            .iter()
            .find(|rule| rule.regex.is_match(body))
            .map(|rule| rule.class)
            .unwrap_or(ChangeClass::Unknown)
    }

    /// Classify `body` and compute the next version from `current`.
    pub fn classify(
        &self,
        body: &str,
        current: &Version,
    ) -> Result<Classification> {
        let mut class = self.matched_class(body);

        if class == ChangeClass::Major
            && current.major == 0
            && !self.breaking_always_increment_major
        {
            debug!("breaking change in a 0.y.z version: treating as minor");
            class = ChangeClass::Minor;
        }

        if class == ChangeClass::Unknown {
            return Err(ProteusError::NoChangeKeyword {
                help: self.help_text(),
            });
        }

        let next = class.bump(current)?;

        info!("{} {current} -> {next}", class.description());

        Ok(Classification {
            class,
            current: current.clone(),
            next,
        })
    }

    /// Explanation plus markdown table of accepted keywords, most common
    /// change type first.
    pub fn help_text(&self) -> String {
        let rows = self
            .rules
            .iter()
            .rev()
            .map(|rule| (rule.class.to_string(), rule.phrases.join(", ")))
            .collect::<Vec<(String, String)>>();

        let type_header = "Change type";
        let keyword_header = "Usable keywords";

        let type_width = rows
            .iter()
            .map(|(t, _)| t.len())
            .chain([type_header.len()])
            .max()
            .unwrap_or_default();
        let keyword_width = rows
            .iter()
            .map(|(_, k)| k.len())
            .chain([keyword_header.len()])
            .max()
            .unwrap_or_default();

        let mut table = format!(
            "| {:<type_width$} | {:<keyword_width$} |\n|{}|{}|\n",
            type_header,
            keyword_header,
            "-".repeat(type_width + 2),
            "-".repeat(keyword_width + 2),
        );

        for (change_type, keywords) in rows {
            table.push_str(&format!(
                "| {change_type:<type_width$} | {keywords:<keyword_width$} |\n"
            ));
        }

        format!("{NO_KEYWORD_PREAMBLE}\n\n{table}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::keywords::KeywordConfigBuilder;

    fn classifier() -> Classifier {
        Classifier::new(&KeywordConfig::default()).unwrap()
    }

    #[test]
    fn breaking_change_bumps_major_after_one_zero() {
        let c = classifier();
        for (major, minor, patch) in [(1, 2, 3), (2, 0, 0), (7, 9, 11)] {
            let result = c
                .classify(
                    "This is a Breaking Change to the API",
                    &Version::new(major, minor, patch),
                )
                .unwrap();
            assert_eq!(result.class, ChangeClass::Major);
            assert_eq!(result.next, Version::new(major + 1, 0, 0));
        }
    }

    #[test]
    fn breaking_change_bumps_minor_before_one_zero() {
        let c = classifier();
        let result = c
            .classify(
                "This is a breaking change to the API",
                &Version::new(0, 4, 0),
            )
            .unwrap();
        assert_eq!(result.class, ChangeClass::Minor);
        assert_eq!(result.next, Version::new(0, 5, 0));
        assert_eq!(result.description(), "Minor version change detected.");
    }

    #[test]
    fn breaking_change_can_always_bump_major() {
        let config = KeywordConfigBuilder::default()
            .breaking_always_increment_major(true)
            .build()
            .unwrap();
        let c = Classifier::new(&config).unwrap();
        let result = c
            .classify("breaking change", &Version::new(0, 4, 2))
            .unwrap();
        assert_eq!(result.next, Version::new(1, 0, 0));
    }

    #[test]
    fn bump_at_component_maximum_is_an_error() {
        let c = classifier();
        for (body, version) in [
            ("breaking change", Version::new(u64::MAX, 0, 0)),
            ("new feature", Version::new(1, u64::MAX, 0)),
            ("bug fix", Version::new(1, 2, u64::MAX)),
        ] {
            let err = c.classify(body, &version).unwrap_err();
            assert!(
                matches!(
                    err,
                    ProteusError::VersionOverflow { ref version } if version.contains("18446744073709551615")
                ),
                "body: {body}"
            );
        }
    }

    #[test]
    fn minor_bump_ignores_maxed_patch() {
        let result = classifier()
            .classify("new feature", &Version::new(1, 2, u64::MAX))
            .unwrap();
        assert_eq!(result.next, Version::new(1, 3, 0));
    }

    #[test]
    fn feature_outranks_fix() {
        let c = classifier();
        let result = c
            .classify(
                "A new feature that also includes a bug fix",
                &Version::new(1, 2, 3),
            )
            .unwrap();
        assert_eq!(result.class, ChangeClass::Minor);
        assert_eq!(result.next, Version::new(1, 3, 0));
    }

    #[test]
    fn patch_keywords() {
        let c = classifier();
        for body in [
            "Fixes a bug fix for login",
            "BUGFIX: trailing slash",
            "Assorted bugfixes",
            "small improvement to logging",
            "patch the parser",
        ] {
            let result = c.classify(body, &Version::new(1, 2, 3)).unwrap();
            assert_eq!(result.class, ChangeClass::Patch, "body: {body}");
            assert_eq!(result.next, Version::new(1, 2, 4));
        }
    }

    #[test]
    fn no_keyword_is_an_error_with_help_table() {
        let c = classifier();
        for body in ["", "Refactor all the things", "# Title\n\nbreaking"] {
            let err = c.classify(body, &Version::new(1, 0, 0)).unwrap_err();
            match err {
                ProteusError::NoChangeKeyword { help } => {
                    assert!(help.starts_with(NO_KEYWORD_PREAMBLE));
                    assert!(help.contains(
                        "| Patch       | bug fix, bugfix, patch, improvement |"
                    ));
                    assert!(help.contains("| Major       | breaking change"));
                }
                other => panic!("unexpected error: {other}"),
            }
        }
    }

    #[test]
    fn help_table_lists_patch_minor_major() {
        let help = classifier().help_text();
        let patch = help.find("| Patch").unwrap();
        let minor = help.find("| Minor").unwrap();
        let major = help.find("| Major").unwrap();
        assert!(patch < minor && minor < major);
    }

    #[test]
    fn custom_phrases_are_literal() {
        let config = KeywordConfigBuilder::default()
            .major(vec!["api.break".to_string()])
            .minor(Vec::<String>::new())
            .patch(vec!["fix".to_string()])
            .build()
            .unwrap();
        let c = Classifier::new(&config).unwrap();
        assert_eq!(c.matched_class("apixbreak"), ChangeClass::Unknown);
        assert_eq!(c.matched_class("an API.BREAK here"), ChangeClass::Major);
        assert_eq!(c.matched_class("a quick fix"), ChangeClass::Patch);
        assert!(!c.help_text().contains("| Minor"));
    }
}
