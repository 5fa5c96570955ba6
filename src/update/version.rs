use std::cmp::Ordering;
use std::fmt;

use crate::error::{Result, UpdateError};

/// Accepted number of dot-separated components, as in `major.minor[.build[.revision]]`
const MIN_PARTS: usize = 2;
const MAX_PARTS: usize = 4;

/// Dotted numeric version such as `1.2`, `1.2.0` or `1.0.0.4`.
///
/// Missing trailing components compare as zero, so `1.2` and `1.2.0` are equal.
#[derive(Debug, Clone)]
pub struct ModVersion {
    parts: Vec<u32>,
}

impl ModVersion {
    pub fn parts(&self) -> &[u32] {
        &self.parts
    }

    fn part(&self, index: usize) -> u32 {
        self.parts.get(index).copied().unwrap_or(0)
    }
}

impl Ord for ModVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.parts.len().max(other.parts.len());
        (0..len)
            .map(|i| self.part(i).cmp(&other.part(i)))
            .find(|o| o.is_ne())
            .unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for ModVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for ModVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ModVersion {}

impl fmt::Display for ModVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<String> = self.parts.iter().map(u32::to_string).collect();
        write!(f, "{}", joined.join("."))
    }
}

/// Parse a dotted numeric version string with two to four components
pub fn parse_version(version_str: &str) -> Result<ModVersion> {
    let trimmed = version_str.trim();
    if trimmed.is_empty() {
        return Err(UpdateError::Parse("empty version string".to_string()));
    }

    let count = trimmed.split('.').count();
    if !(MIN_PARTS..=MAX_PARTS).contains(&count) {
        return Err(UpdateError::Parse(format!(
            "Invalid version '{}': expected {} to {} components, got {}",
            version_str, MIN_PARTS, MAX_PARTS, count
        )));
    }

    let parts = trimmed
        .split('.')
        .map(|part| {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(UpdateError::Parse(format!(
                    "Invalid version '{}': bad component '{}'",
                    version_str, part
                )));
            }
            part.parse::<u32>().map_err(|e| {
                UpdateError::Parse(format!("Invalid version '{}': {}", version_str, e))
            })
        })
        .collect::<Result<Vec<u32>>>()?;

    Ok(ModVersion { parts })
}

/// Release tag without a single leading `v` or `V`
pub fn version_from_tag(tag: &str) -> &str {
    let tag = tag.trim();
    tag.strip_prefix('v')
        .or_else(|| tag.strip_prefix('V'))
        .unwrap_or(tag)
}

/// Parse a release tag, dropping a single leading `v` or `V`
pub fn parse_tag(tag: &str) -> Result<ModVersion> {
    parse_version(version_from_tag(tag))
}

/// Whether `remote_tag` is strictly newer than `local_version`.
///
/// Fails with `UpdateError::Parse` when either side is not a valid version.
pub fn compare_newer(remote_tag: &str, local_version: &str) -> Result<bool> {
    let remote = parse_tag(remote_tag)?;
    let local = parse_version(local_version)?;
    Ok(remote > local)
}

/// True only when both strings parse and the remote tag is strictly newer.
/// Anything unparseable means there is nothing to do.
pub fn is_newer(remote_tag: &str, local_version: &str) -> bool {
    compare_newer(remote_tag, local_version).unwrap_or(false)
}
