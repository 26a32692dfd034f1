//! Read-only views of registry release records, plus release-notes
//! extraction.
//!
//! A [`Release`] is fetched fresh on every update check and never cached or
//! mutated; it lives only for the duration of one check.

use crate::version::Version;
use serde::Deserialize;

/// Name of the platform-specific replacement-executable asset. A release
/// without an asset of this exact name is not actionable.
pub const UPDATE_ASSET_NAME: &str = "update";

/// Markers the release-authoring tool embeds around the human-readable
/// notes excerpt. Comment-style markdown so they render as nothing on the
/// registry's web view.
const NOTES_START_MARKER: &str = "\r\n[//]: # (begin_release_notes)";
const NOTES_END_MARKER: &str = "\r\n[//]: # (end_release_notes)";

/// A named downloadable file attached to a release.
#[derive(Debug, Clone, Deserialize)]
pub struct Asset {
    pub name: String,
    pub browser_download_url: String,
}

/// One release as served by the registry.
#[derive(Debug, Clone, Deserialize)]
pub struct Release {
    #[serde(default)]
    pub name: String,
    pub tag_name: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub assets: Vec<Asset>,
}

impl Release {
    /// The replacement-executable asset, if the release carries one.
    pub fn executable_asset(&self) -> Option<&Asset> {
        self.assets.iter().find(|a| a.name == UPDATE_ASSET_NAME)
    }

    /// Version to show the user: the strictly parsed tag, or a lenient
    /// search of the release name for updater-channel releases whose tag is
    /// not a version.
    pub fn display_version(&self) -> Option<Version> {
        Version::parse(&self.tag_name).or_else(|| Version::find(&self.name))
    }
}

/// Extracts the delimited notes excerpt from a release body.
///
/// First occurrence of the start marker, last occurrence of the end marker;
/// the substring strictly between them is returned unmodified. Absence of
/// either marker yields `None` — unstructured bodies are expected, not an
/// error.
pub fn extract_notes(body: &str) -> Option<&str> {
    let start = body.find(NOTES_START_MARKER)? + NOTES_START_MARKER.len();
    let end = body.rfind(NOTES_END_MARKER)?;
    if end < start {
        return None;
    }
    Some(&body[start..end])
}
