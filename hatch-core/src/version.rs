//! Semantic versions as used by plugin release tags
//!
//! Text format: `[v]MAJOR.MINOR.PATCH[-PRERELEASE][+BUILD]`.
//!
//! Ordering and equality look at `(major, minor, patch)` only. Pre-release
//! and build identifiers are kept and rendered back, but two versions that
//! differ only in them compare equal.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Errors from parsing version text
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VersionError {
    #[error("Invalid version format: {input:?}")]
    InvalidFormat { input: String },
}

/// A semantic version
#[derive(Debug, Clone, Default)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    /// Dot-separated identifiers after `-`
    pub prerelease: Vec<String>,
    /// Dot-separated identifiers after `+`
    pub build_metadata: Vec<String>,
    /// The text started with `v` or `V`
    pub has_leading_marker: bool,
}

impl Version {
    /// Version without marker or metadata
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
            ..Default::default()
        }
    }

    /// Builder: render with a leading `v`
    pub fn with_leading_marker(mut self) -> Self {
        self.has_leading_marker = true;
        self
    }

    /// Parse version text.
    ///
    /// At least three dot-separated numeric components are required; any
    /// components after the third are ignored.
    pub fn parse(text: &str) -> Result<Self, VersionError> {
        let invalid = || VersionError::InvalidFormat {
            input: text.to_string(),
        };

        let trimmed = text.trim();
        let (has_leading_marker, rest) = match trimmed.strip_prefix(['v', 'V']) {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };

        let (rest, build_metadata) = match rest.split_once('+') {
            Some((rest, build)) => (rest, identifiers(build).ok_or_else(invalid)?),
            None => (rest, Vec::new()),
        };

        let (core, prerelease) = match rest.split_once('-') {
            Some((core, pre)) => (core, identifiers(pre).ok_or_else(invalid)?),
            None => (rest, Vec::new()),
        };

        let components: Vec<&str> = core.split('.').collect();
        if components.len() < 3 {
            return Err(invalid());
        }

        let number = |s: &str| -> Result<u64, VersionError> {
            if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
            s.parse().map_err(|_| invalid())
        };

        Ok(Self {
            major: number(components[0])?,
            minor: number(components[1])?,
            patch: number(components[2])?,
            prerelease,
            build_metadata,
            has_leading_marker,
        })
    }

    /// The `(major, minor, patch)` triple that ordering is defined over
    pub fn triple(&self) -> (u64, u64, u64) {
        (self.major, self.minor, self.patch)
    }
}

/// Split `a.b.c` into identifiers; `None` if any is empty or has characters
/// outside `[0-9A-Za-z-]`.
fn identifiers(text: &str) -> Option<Vec<String>> {
    text.split('.')
        .map(|id| {
            let valid = !id.is_empty() && id.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-');
            valid.then(|| id.to_string())
        })
        .collect()
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.has_leading_marker {
            f.write_str("v")?;
        }
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if !self.prerelease.is_empty() {
            write!(f, "-{}", self.prerelease.join("."))?;
        }
        if !self.build_metadata.is_empty() {
            write!(f, "+{}", self.build_metadata.join("."))?;
        }
        Ok(())
    }
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.triple() == other.triple()
    }
}

impl Eq for Version {}

impl Hash for Version {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.triple().hash(state);
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.major
            .cmp(&other.major)
            .then_with(|| self.minor.cmp(&other.minor))
            .then_with(|| self.patch.cmp(&other.patch))
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse(&text).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain() {
        let version = Version::parse("1.0.0").unwrap();
        assert_eq!(version.major, 1);
        assert_eq!(version.minor, 0);
        assert_eq!(version.patch, 0);
        assert!(!version.has_leading_marker);
        assert_eq!(version.to_string(), "1.0.0");
    }

    #[test]
    fn test_parse_leading_marker_round_trips() {
        let version = Version::parse("v1.2.3").unwrap();
        assert!(version.has_leading_marker);
        assert_eq!(version.triple(), (1, 2, 3));
        assert_eq!(version.to_string(), "v1.2.3");

        let upper = Version::parse("V1.2.3").unwrap();
        assert!(upper.has_leading_marker);
        assert_eq!(upper.to_string(), "v1.2.3");
    }

    #[test]
    fn test_too_few_components_is_an_error() {
        assert_eq!(
            Version::parse("1"),
            Err(VersionError::InvalidFormat {
                input: "1".to_string()
            })
        );
        assert!(Version::parse("1.2").is_err());
        assert!(Version::parse("").is_err());
        assert!(Version::parse("v").is_err());
    }

    #[test]
    fn test_non_numeric_components_are_errors() {
        assert!(Version::parse("a.b.c").is_err());
        assert!(Version::parse("1.x.3").is_err());
        assert!(Version::parse("1..3").is_err());
        assert!(Version::parse("-1.0.0").is_err());
    }

    #[test]
    fn test_extra_components_are_ignored() {
        let version = Version::parse("1.2.3.4").unwrap();
        assert_eq!(version.triple(), (1, 2, 3));
    }

    #[test]
    fn test_prerelease_and_build_metadata() {
        let version = Version::parse("v2.0.0-beta.1+build.5").unwrap();
        assert_eq!(version.triple(), (2, 0, 0));
        assert_eq!(version.prerelease, vec!["beta", "1"]);
        assert_eq!(version.build_metadata, vec!["build", "5"]);
        assert_eq!(version.to_string(), "v2.0.0-beta.1+build.5");

        let build_only = Version::parse("1.0.0+sha-abc").unwrap();
        assert!(build_only.prerelease.is_empty());
        assert_eq!(build_only.build_metadata, vec!["sha-abc"]);
    }

    #[test]
    fn test_malformed_identifiers_are_errors() {
        assert!(Version::parse("1.0.0-").is_err());
        assert!(Version::parse("1.0.0+").is_err());
        assert!(Version::parse("1.0.0-beta..1").is_err());
        assert!(Version::parse("1.0.0-be_ta").is_err());
    }

    #[test]
    fn test_ordering_is_lexicographic_over_triple() {
        let v = |s: &str| Version::parse(s).unwrap();

        assert!(v("1.0.0") < v("1.0.1"));
        assert!(v("1.0.9") < v("1.1.0"));
        assert!(v("1.9.9") < v("2.0.0"));
        assert!(v("0.10.0") > v("0.9.0"));
        assert_eq!(v("1.2.3").cmp(&v("v1.2.3")), Ordering::Equal);
    }

    #[test]
    fn test_metadata_does_not_affect_equality() {
        let plain = Version::parse("1.0.0").unwrap();
        let beta = Version::parse("1.0.0-beta").unwrap();
        let built = Version::parse("v1.0.0+abc").unwrap();

        assert_eq!(plain, beta);
        assert_eq!(beta, built);
        assert_eq!(plain.cmp(&built), Ordering::Equal);
    }

    #[test]
    fn test_sorting() {
        let mut versions: Vec<Version> = ["v1.0.1", "0.9.0", "v1.0.0", "2.0.0"]
            .iter()
            .map(|s| s.parse().unwrap())
            .collect();
        versions.sort();

        let rendered: Vec<String> = versions.iter().map(ToString::to_string).collect();
        assert_eq!(rendered, vec!["0.9.0", "v1.0.0", "v1.0.1", "2.0.0"]);
    }

    #[test]
    fn test_serde_as_string() {
        let version = Version::parse("v1.1.2").unwrap();
        let json = serde_json::to_string(&version).unwrap();
        assert_eq!(json, "\"v1.1.2\"");

        let parsed: Version = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, version);
        assert!(parsed.has_leading_marker);

        assert!(serde_json::from_str::<Version>("\"1\"").is_err());
    }
}
