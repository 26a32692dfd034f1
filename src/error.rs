//! Error types for the update pipeline.

use std::path::PathBuf;

/// Top-level error type for update resolution and installation.
///
/// A declined confirmation is not an error; it is reported as
/// [`crate::installer::InstallOutcome::Declined`]. Nothing in this crate
/// aborts the host process: every failure surfaces as one of these variants
/// and the previous executable stays in its last-known-good location
/// whenever possible.
#[derive(Debug, thiserror::Error)]
pub enum UpdateError {
    /// Registry unreachable or a non-200 response. The check failed;
    /// nothing changed on disk. Distinct from "up to date".
    #[error("release check failed: {0}")]
    FetchFailed(String),

    /// A string that was expected to carry a semantic version did not.
    #[error("no version found in {0:?}")]
    NoVersionFound(String),

    /// The chosen release has no asset named `update`. A configuration
    /// problem on the registry side, not a missing-update condition.
    #[error("misconfigured update assets: release has no `update` asset")]
    MisconfiguredAssets,

    /// Staging-directory or swap failure, with the offending path.
    #[error("filesystem error at {}: {}", .path.display(), .detail)]
    Filesystem { path: PathBuf, detail: String },

    /// Configuration file error.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, UpdateError>;
