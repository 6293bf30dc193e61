//! Control plane version handling.
//!
//! The server reports its core version as a free-form string that may carry
//! more than three dot-segments and build metadata (e.g. `5.3.0.1+build42`).
//! [`sanitize_version`] reduces such strings to `major.minor.patch` plus an
//! optional pre-release suffix, and [`ServerVersion`] gives them an ordering
//! so resources can declare the minimum version they need.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Error returned when a version string cannot be interpreted.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Invalid version '{version}'. Expected 'major.minor.patch' with an optional '-pre' suffix.")]
pub struct InvalidVersionError {
    /// The offending input.
    pub version: String,
}

/// Result of [`sanitize_version`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SanitizedVersion {
    /// The first three dot-segments plus any pre-release suffix.
    pub version: String,
    /// Whether segments or build metadata were dropped.
    pub truncated: bool,
}

/// Normalizes a raw version string.
///
/// Keeps exactly the first three dot-segments of the core version plus any
/// pre-release suffix, and drops build metadata. `truncated` records whether
/// anything was removed; it is diagnostic only.
///
/// # Example
///
/// ```rust
/// use storage_api::config::sanitize_version;
///
/// let v = sanitize_version("5.3.0-beta.1");
/// assert_eq!(v.version, "5.3.0-beta.1");
/// assert!(!v.truncated);
///
/// let v = sanitize_version("5.3.0.1+buildxyz");
/// assert_eq!(v.version, "5.3.0");
/// assert!(v.truncated);
/// ```
#[must_use]
pub fn sanitize_version(raw: &str) -> SanitizedVersion {
    let raw = raw.trim();
    let raw = raw
        .strip_prefix('v')
        .or_else(|| raw.strip_prefix('V'))
        .unwrap_or(raw);

    let (main, build) = match raw.split_once('+') {
        Some((main, build)) => (main, Some(build)),
        None => (raw, None),
    };
    let (core, pre) = match main.split_once('-') {
        Some((core, pre)) => (core, Some(pre)),
        None => (main, None),
    };

    let segments: Vec<&str> = core.split('.').collect();
    let truncated = build.is_some() || segments.len() > 3;

    let mut version = segments
        .iter()
        .take(3)
        .copied()
        .collect::<Vec<_>>()
        .join(".");
    if let Some(pre) = pre {
        version.push('-');
        version.push_str(pre);
    }

    SanitizedVersion { version, truncated }
}

/// A comparable control plane version.
///
/// Ordering follows semantic-versioning precedence: numeric core first, then
/// a version without a pre-release suffix ranks above one with a suffix.
///
/// # Example
///
/// ```rust
/// use storage_api::ServerVersion;
///
/// let installed: ServerVersion = "5.3.0.1+build7".parse().unwrap();
/// let minimum: ServerVersion = "5.2.4".parse().unwrap();
/// assert!(installed >= minimum);
/// assert_eq!(installed.to_string(), "5.3.0");
/// assert!(installed.was_truncated());
/// ```
#[derive(Clone, Debug)]
pub struct ServerVersion {
    major: u64,
    minor: u64,
    patch: u64,
    pre: Option<String>,
    truncated: bool,
}

impl ServerVersion {
    /// Parses and sanitizes a version string.
    ///
    /// Missing minor or patch segments are read as zero.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidVersionError`] if a core segment is not numeric.
    pub fn parse(raw: &str) -> Result<Self, InvalidVersionError> {
        let invalid = || InvalidVersionError {
            version: raw.to_string(),
        };
        let sanitized = sanitize_version(raw);

        let (core, pre) = match sanitized.version.split_once('-') {
            Some((core, pre)) if !pre.is_empty() => (core, Some(pre.to_string())),
            Some(_) => return Err(invalid()),
            None => (sanitized.version.as_str(), None),
        };

        let mut numbers = [0_u64; 3];
        for (slot, segment) in numbers.iter_mut().zip(core.split('.')) {
            *slot = segment.parse().map_err(|_| invalid())?;
        }

        Ok(Self {
            major: numbers[0],
            minor: numbers[1],
            patch: numbers[2],
            pre,
            truncated: sanitized.truncated,
        })
    }

    /// Returns the major version.
    #[must_use]
    pub const fn major(&self) -> u64 {
        self.major
    }

    /// Returns the minor version.
    #[must_use]
    pub const fn minor(&self) -> u64 {
        self.minor
    }

    /// Returns the patch version.
    #[must_use]
    pub const fn patch(&self) -> u64 {
        self.patch
    }

    /// Returns the pre-release suffix, if any.
    #[must_use]
    pub fn pre_release(&self) -> Option<&str> {
        self.pre.as_deref()
    }

    /// Returns `true` if sanitizing the original string dropped anything.
    #[must_use]
    pub const fn was_truncated(&self) -> bool {
        self.truncated
    }
}

fn compare_pre_release(a: &str, b: &str) -> Ordering {
    let mut left = a.split('.');
    let mut right = b.split('.');
    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                let ordering = match (x.parse::<u64>(), y.parse::<u64>()) {
                    (Ok(x), Ok(y)) => x.cmp(&y),
                    // Numeric identifiers rank below alphanumeric ones.
                    (Ok(_), Err(_)) => Ordering::Less,
                    (Err(_), Ok(_)) => Ordering::Greater,
                    (Err(_), Err(_)) => x.cmp(y),
                };
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
        }
    }
}

impl PartialEq for ServerVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ServerVersion {}

impl PartialOrd for ServerVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ServerVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch)
            .cmp(&(other.major, other.minor, other.patch))
            .then_with(|| match (&self.pre, &other.pre) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(a), Some(b)) => compare_pre_release(a, b),
            })
    }
}

impl fmt::Display for ServerVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(pre) = &self.pre {
            write!(f, "-{pre}")?;
        }
        Ok(())
    }
}

impl FromStr for ServerVersion {
    type Err = InvalidVersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_keeps_pre_release() {
        let v = sanitize_version("5.3.0-beta.1");
        assert_eq!(v.version, "5.3.0-beta.1");
        assert!(!v.truncated);
    }

    #[test]
    fn test_sanitize_drops_extra_segments_and_build() {
        let v = sanitize_version("5.3.0.1+buildxyz");
        assert_eq!(v.version, "5.3.0");
        assert!(v.truncated);
    }

    #[test]
    fn test_sanitize_build_metadata_alone_is_truncation() {
        let v = sanitize_version("5.3.0+abc");
        assert_eq!(v.version, "5.3.0");
        assert!(v.truncated);
    }

    #[test]
    fn test_sanitize_plain_version_untouched() {
        let v = sanitize_version("5.3.0");
        assert_eq!(v.version, "5.3.0");
        assert!(!v.truncated);
    }

    #[test]
    fn test_parse_pads_missing_segments() {
        let v = ServerVersion::parse("5.3").unwrap();
        assert_eq!((v.major(), v.minor(), v.patch()), (5, 3, 0));
    }

    #[test]
    fn test_parse_rejects_non_numeric_core() {
        assert!(ServerVersion::parse("five.3.0").is_err());
        assert!(ServerVersion::parse("").is_err());
        assert!(ServerVersion::parse("5.3.0-").is_err());
    }

    #[test]
    fn test_ordering_on_core_segments() {
        let older: ServerVersion = "5.2.9".parse().unwrap();
        let newer: ServerVersion = "5.10.0".parse().unwrap();
        assert!(older < newer);
    }

    #[test]
    fn test_pre_release_ranks_below_release() {
        let beta: ServerVersion = "5.3.0-beta.1".parse().unwrap();
        let release: ServerVersion = "5.3.0".parse().unwrap();
        let beta2: ServerVersion = "5.3.0-beta.2".parse().unwrap();
        let beta11: ServerVersion = "5.3.0-beta.11".parse().unwrap();
        assert!(beta < release);
        assert!(beta < beta2);
        assert!(beta2 < beta11);
    }

    #[test]
    fn test_truncated_versions_compare_equal_to_sanitized() {
        let a: ServerVersion = "5.3.0.7".parse().unwrap();
        let b: ServerVersion = "5.3.0".parse().unwrap();
        assert_eq!(a, b);
        assert!(a.was_truncated());
        assert!(!b.was_truncated());
    }

    #[test]
    fn test_display_round_trips_sanitized_form() {
        let v: ServerVersion = "v5.3.0-rc1+x".parse().unwrap();
        assert_eq!(v.to_string(), "5.3.0-rc1");
    }
}
