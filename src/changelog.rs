//! Changelog entry synthesis and merging.
//!
//! The changelog is a single markdown document whose entries each start
//! with the level-2 marker `"## "`. Everything before the first marker is
//! the preamble. A new entry is spliced in directly after the preamble, so
//! the preamble and every existing entry keep their exact bytes.
use chrono::{DateTime, FixedOffset};
use log::*;
use semver::Version;
use std::{fs, io::ErrorKind, path::Path};

use crate::Result;

/// Marker that starts every changelog entry.
pub const ENTRY_MARKER: &str = "## ";
/// Content used when no changelog exists yet.
pub const EMPTY_CHANGELOG: &str = "# Change log\n\n";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Data for a single changelog entry.
#[derive(Debug, Clone)]
pub struct Entry<'a> {
    pub version: &'a Version,
    pub pr_number: u64,
    pub pr_link: &'a str,
    pub created_at: &'a DateTime<FixedOffset>,
    pub title: &'a str,
    pub body: &'a str,
}

impl Entry<'_> {
    /// Render the entry without its leading marker.
    pub fn render(&self) -> String {
        format!(
            "{} ([#{}]({}) {})\n\n{}\n\n{}\n\n",
            self.version,
            self.pr_number,
            self.pr_link,
            self.created_at.format(TIMESTAMP_FORMAT),
            self.title,
            self.body
        )
    }
}

/// Split `changelog` at the first entry marker into the preamble and the
/// remainder (which starts with the marker, or is empty).
pub fn split_preamble(changelog: &str) -> (&str, &str) {
    match changelog.find(ENTRY_MARKER) {
        Some(idx) => changelog.split_at(idx),
        None => (changelog, ""),
    }
}

/// Insert a rendered entry as the newest entry of `changelog`.
pub fn merge(changelog: &str, rendered_entry: &str) -> String {
    let (preamble, entries) = split_preamble(changelog);
    format!("{preamble}{ENTRY_MARKER}{rendered_entry}{entries}")
}

/// Read the changelog, treating a missing file as a fresh document.
pub fn read_changelog(path: &Path) -> Result<String> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(content),
        Err(err) if err.kind() == ErrorKind::NotFound => {
            info!("{} not found: starting a new change log", path.display());
            Ok(EMPTY_CHANGELOG.to_string())
        }
        Err(err) => Err(err.into()),
    }
}

/// Merge `entry` into the changelog at `path` and overwrite the file.
pub fn update_changelog_file(path: &Path, entry: &Entry) -> Result<String> {
    let existing = read_changelog(path)?;
    let updated = merge(&existing, &entry.render());
    debug!("writing {} bytes to {}", updated.len(), path.display());
    fs::write(path, &updated)?;
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use tempfile::TempDir;

    const EXISTING: &str = "# Change log\n\nSome intro text.\n\n## 1.2.3 ([#41](https://git.example.com/o/r/pull/41) 2024-01-01 10:00:00)\n\nOlder\n\nbody\n\n## 1.2.2 ([#40](https://git.example.com/o/r/pull/40) 2023-12-01 10:00:00)\n\nOldest\n\n#### nested heading\n\n";

    fn timestamp() -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339("2024-02-03T04:05:06Z").unwrap()
    }

    #[test]
    fn renders_entry_header() {
        let version = Version::new(1, 2, 4);
        let created_at = timestamp();
        let entry = Entry {
            version: &version,
            pr_number: 42,
            pr_link: "https://git.example.com/o/r/pull/42",
            created_at: &created_at,
            title: "Fix login",
            body: "Fixes a bug fix for login",
        };
        assert_eq!(
            entry.render(),
            "1.2.4 ([#42](https://git.example.com/o/r/pull/42) 2024-02-03 04:05:06)\n\nFix login\n\nFixes a bug fix for login\n\n"
        );
    }

    #[test]
    fn merge_preserves_preamble_and_entries() {
        let merged = merge(EXISTING, "1.2.4 (new)\n\nNew\n\n");

        let (old_preamble, old_entries) = split_preamble(EXISTING);
        let (new_preamble, new_entries) = split_preamble(&merged);

        assert_eq!(new_preamble, old_preamble);
        assert_eq!(new_preamble, "# Change log\n\nSome intro text.\n\n");
        assert!(new_entries.starts_with("## 1.2.4 (new)\n\nNew\n\n## 1.2.3"));
        assert!(new_entries.ends_with(old_entries));

        let old: Vec<&str> = EXISTING.split(ENTRY_MARKER).skip(1).collect();
        let new: Vec<&str> = merged.split(ENTRY_MARKER).skip(2).collect();
        assert_eq!(old, new);
    }

    #[test]
    fn merge_into_preamble_only() {
        assert_eq!(
            merge(EMPTY_CHANGELOG, "0.0.1 (x)\n\n"),
            "# Change log\n\n## 0.0.1 (x)\n\n"
        );
    }

    #[test]
    fn merge_into_empty_document() {
        assert_eq!(merge("", "0.0.1 (x)\n\n"), "## 0.0.1 (x)\n\n");
    }

    #[test]
    fn missing_file_starts_new_changelog() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("CHANGELOG.md");
        let version = Version::new(0, 1, 0);
        let created_at = timestamp();
        let entry = Entry {
            version: &version,
            pr_number: 1,
            pr_link: "https://x/o/r/pull/1",
            created_at: &created_at,
            title: "First",
            body: "new feature",
        };

        let written = update_changelog_file(&path, &entry).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), written);
        assert!(written.starts_with(
            "# Change log\n\n## 0.1.0 ([#1](https://x/o/r/pull/1) 2024-02-03 04:05:06)\n\nFirst\n\nnew feature\n\n"
        ));
    }

    #[test]
    fn existing_file_is_overwritten_in_full() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("CHANGELOG.md");
        fs::write(&path, EXISTING).unwrap();
        let version = Version::new(1, 2, 4);
        let created_at = timestamp();
        let entry = Entry {
            version: &version,
            pr_number: 42,
            pr_link: "https://git.example.com/o/r/pull/42",
            created_at: &created_at,
            title: "Fix login",
            body: "bug fix",
        };

        update_changelog_file(&path, &entry).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("## 1.2.4 ([#42]"));
        assert!(content.ends_with(split_preamble(EXISTING).1));
        assert!(content.find("## 1.2.4").unwrap() < content.find("## 1.2.3").unwrap());
    }
}
