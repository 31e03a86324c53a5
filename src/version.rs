//! Three-part version number stored in the VERSION file.
use log::*;
use semver::Version;
use std::{fs, io::ErrorKind, path::Path};

use crate::Result;

/// Outcome of reading the version file.
///
/// Absent and unreadable files both fall back to `0.0.0` but are kept apart
/// so the caller can warn about a corrupt file instead of silently
/// restarting the version history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionRead {
    Parsed(Version),
    Missing,
    Corrupt { content: String, reason: String },
}

impl VersionRead {
    /// The version to bump from: the parsed version or `0.0.0`.
    pub fn version(&self) -> Version {
        match self {
            VersionRead::Parsed(v) => v.clone(),
            _ => Version::new(0, 0, 0),
        }
    }
}

/// Parse a dotted `major.minor.patch` triple. Pre-release and build
/// metadata are rejected.
pub fn parse_version(content: &str) -> std::result::Result<Version, String> {
    let trimmed = content.trim();
    let version = Version::parse(trimmed).map_err(|e| e.to_string())?;
    if !version.pre.is_empty() || !version.build.is_empty() {
        return Err(format!(
            "only major.minor.patch versions are supported: {trimmed}"
        ));
    }
    Ok(version)
}

/// Classify raw version file content.
pub fn interpret(content: &str) -> VersionRead {
    match parse_version(content) {
        Ok(v) => VersionRead::Parsed(v),
        Err(reason) => VersionRead::Corrupt {
            content: content.to_string(),
            reason,
        },
    }
}

/// Read the version file at `path`.
pub fn read_version_file(path: &Path) -> Result<VersionRead> {
    let read = match fs::read_to_string(path) {
        Ok(content) => interpret(&content),
        Err(err) if err.kind() == ErrorKind::NotFound => VersionRead::Missing,
        Err(err) => return Err(err.into()),
    };

    match &read {
        VersionRead::Parsed(v) => debug!("current version: {v}"),
        VersionRead::Missing => {
            info!("{} not found: starting from 0.0.0", path.display())
        }
        VersionRead::Corrupt { content, reason } => warn!(
            "{} could not be parsed ({reason}): found {:?}, starting from 0.0.0",
            path.display(),
            content.trim()
        ),
    }

    Ok(read)
}

/// Overwrite the version file with `version` (no trailing newline).
pub fn write_version_file(path: &Path, version: &Version) -> Result<()> {
    fs::write(path, version.to_string())?;
    Ok(())
}
