//! Semantic version triple with strict and lenient construction paths.
//!
//! [`Version::parse`] accepts a well-formed tag (`"1.2.3"`, `"v1.2.3"`) and
//! nothing else; [`Version::find`] tolerates a version embedded anywhere in
//! a larger human-readable string (`"Updater v2.0.0"`). The two are kept as
//! separate named operations because their fallback semantics differ in the
//! resolver: the updater channel is matched leniently on the release name,
//! the latest channel strictly on the tag.

use crate::error::{Result, UpdateError};

/// A `(major, minor, patch)` triple, ordered lexicographically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl Version {
    /// Creates a version from its three components.
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Strict parse: optional leading `v`/`V`, then exactly
    /// `MAJOR.MINOR.PATCH`. Returns `None` on any other shape.
    pub fn parse(tag: &str) -> Option<Self> {
        let tag = tag.trim();
        let tag = tag
            .strip_prefix('v')
            .or_else(|| tag.strip_prefix('V'))
            .unwrap_or(tag);
        let (version, rest) = parse_prefix(tag)?;
        rest.is_empty().then_some(version)
    }

    /// Strict parse that reports the offending string instead of `None`.
    pub fn parse_required(tag: &str) -> Result<Self> {
        Self::parse(tag).ok_or_else(|| UpdateError::NoVersionFound(tag.to_owned()))
    }

    /// Lenient search: the first `MAJOR.MINOR.PATCH` substring anywhere in
    /// `text`. Trailing characters after the patch number are tolerated.
    pub fn find(text: &str) -> Option<Self> {
        let bytes = text.as_bytes();
        for i in 0..bytes.len() {
            if bytes[i].is_ascii_digit() && (i == 0 || !bytes[i - 1].is_ascii_digit()) {
                if let Some((version, _rest)) = parse_prefix(&text[i..]) {
                    return Some(version);
                }
            }
        }
        None
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Parses `N.N.N` at the start of `s`, returning the remainder.
fn parse_prefix(s: &str) -> Option<(Version, &str)> {
    let (major, rest) = take_number(s)?;
    let rest = rest.strip_prefix('.')?;
    let (minor, rest) = take_number(rest)?;
    let rest = rest.strip_prefix('.')?;
    let (patch, rest) = take_number(rest)?;
    Some((Version::new(major, minor, patch), rest))
}

/// Takes a leading run of ASCII digits. Overflowing `u32` counts as no
/// number at all.
fn take_number(s: &str) -> Option<(u32, &str)> {
    let end = s
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(s.len());
    if end == 0 {
        return None;
    }
    let number = s[..end].parse().ok()?;
    Some((number, &s[end..]))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[test]
    fn parse_canonical_forms() {
        assert_eq!(Version::parse("1.2.3"), Some(Version::new(1, 2, 3)));
        assert_eq!(Version::parse("v1.2.3"), Some(Version::new(1, 2, 3)));
        assert_eq!(Version::parse("V10.0.7"), Some(Version::new(10, 0, 7)));
        assert_eq!(Version::parse(" v0.2.0 "), Some(Version::new(0, 2, 0)));
    }

    #[test]
    fn parse_round_trips_display() {
        let version = Version::new(4, 17, 203);
        assert_eq!(Version::parse(&format!("v{version}")), Some(version));
        assert_eq!(Version::parse(&version.to_string()), Some(version));
    }

    #[test]
    fn parse_rejects_malformed_tags() {
        assert_eq!(Version::parse(""), None);
        assert_eq!(Version::parse("updater-v2"), None);
        assert_eq!(Version::parse("1.2"), None);
        assert_eq!(Version::parse("1.2.3.4"), None);
        assert_eq!(Version::parse("1.2.3-beta"), None);
        assert_eq!(Version::parse("vv1.2.3"), None);
        assert_eq!(Version::parse("release 1.2.3"), None);
    }

    #[test]
    fn parse_rejects_overflowing_components() {
        assert_eq!(Version::parse("99999999999.0.0"), None);
    }

    #[test]
    fn parse_required_reports_the_input() {
        let err = Version::parse_required("not-a-version").unwrap_err();
        assert!(matches!(err, UpdateError::NoVersionFound(s) if s == "not-a-version"));
    }

    #[test]
    fn find_inside_larger_strings() {
        assert_eq!(
            Version::find("Updater v2.0.0"),
            Some(Version::new(2, 0, 0))
        );
        assert_eq!(
            Version::find("release 1.4.9 (stable)"),
            Some(Version::new(1, 4, 9))
        );
        assert_eq!(Version::find("3.2.1"), Some(Version::new(3, 2, 1)));
    }

    #[test]
    fn find_returns_the_first_match() {
        assert_eq!(
            Version::find("from 1.0.0 to 2.0.0"),
            Some(Version::new(1, 0, 0))
        );
    }

    #[test]
    fn find_skips_partial_versions() {
        assert_eq!(Version::find("chapter 1.2, page 3"), None);
        assert_eq!(Version::find("no numbers here"), None);
        assert_eq!(Version::find(""), None);
    }

    #[test]
    fn ordering_is_lexicographic_on_the_triple() {
        assert!(Version::new(1, 2, 0) > Version::new(1, 1, 9));
        assert!(Version::new(2, 0, 0) > Version::new(1, 9, 9));
        assert!(Version::new(0, 9, 9) < Version::new(1, 0, 0));
        assert!(Version::new(1, 0, 10) > Version::new(1, 0, 9));
        assert_eq!(Version::new(1, 2, 3), Version::new(1, 2, 3));
        assert!(Version::new(1, 2, 3) >= Version::new(1, 2, 3));
    }
}
