//! Updater configuration.
//!
//! Built-in defaults point at the project's own release registry; a TOML
//! file can override any field. All fields have defaults so a partial file
//! is fine.

use crate::error::{Result, UpdateError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for the release registry and the install staging area.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdaterConfig {
    /// Release registry API base URL.
    pub api_base: String,
    /// Repository slug, `owner/name`.
    pub repo: String,
    /// Pinned tag of the forced-migration updater channel.
    pub updater_tag: String,
    /// User agent sent on every registry and download request.
    pub user_agent: String,
    /// Staging directory override. Defaults to an app-scoped directory
    /// under the OS temp directory.
    pub staging_dir: Option<PathBuf>,
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.github.com".to_owned(),
            repo: "moult-app/moult".to_owned(),
            updater_tag: "updater-v1".to_owned(),
            user_agent: concat!("moult/", env!("CARGO_PKG_VERSION"), " (self-update)")
                .to_owned(),
            staging_dir: None,
        }
    }
}

impl UpdaterConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        toml::from_str(&text)
            .map_err(|e| UpdateError::Config(format!("{}: {e}", path.display())))
    }

    /// Endpoint of the pinned updater-channel release.
    pub fn updater_release_url(&self) -> String {
        format!(
            "{}/repos/{}/releases/tags/{}",
            self.api_base.trim_end_matches('/'),
            self.repo,
            self.updater_tag
        )
    }

    /// Endpoint of the registry's latest ordinary release.
    pub fn latest_release_url(&self) -> String {
        format!(
            "{}/repos/{}/releases/latest",
            self.api_base.trim_end_matches('/'),
            self.repo
        )
    }

    /// Where downloaded assets are staged before the swap.
    pub fn staging_path(&self) -> PathBuf {
        self.staging_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("moult"))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[test]
    fn default_endpoints_are_well_formed() {
        let config = UpdaterConfig::default();
        assert_eq!(
            config.updater_release_url(),
            "https://api.github.com/repos/moult-app/moult/releases/tags/updater-v1"
        );
        assert_eq!(
            config.latest_release_url(),
            "https://api.github.com/repos/moult-app/moult/releases/latest"
        );
    }

    #[test]
    fn trailing_slash_on_api_base_is_tolerated() {
        let config = UpdaterConfig {
            api_base: "https://registry.example.test/".to_owned(),
            ..Default::default()
        };
        assert_eq!(
            config.latest_release_url(),
            "https://registry.example.test/repos/moult-app/moult/releases/latest"
        );
    }

    #[test]
    fn staging_path_defaults_under_temp() {
        let config = UpdaterConfig::default();
        assert!(config.staging_path().starts_with(std::env::temp_dir()));
        assert!(config.staging_path().ends_with("moult"));
    }

    #[test]
    fn staging_path_honours_the_override() {
        let config = UpdaterConfig {
            staging_dir: Some(PathBuf::from("/srv/stage")),
            ..Default::default()
        };
        assert_eq!(config.staging_path(), PathBuf::from("/srv/stage"));
    }

    #[test]
    fn partial_toml_keeps_defaults_for_the_rest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("moult.toml");
        std::fs::write(&path, "repo = \"acme/app\"\nupdater_tag = \"updater-v3\"\n")
            .unwrap();

        let config = UpdaterConfig::from_file(&path).unwrap();
        assert_eq!(config.repo, "acme/app");
        assert_eq!(config.updater_tag, "updater-v3");
        assert_eq!(config.api_base, "https://api.github.com");
    }

    #[test]
    fn malformed_toml_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("moult.toml");
        std::fs::write(&path, "repo = [broken").unwrap();

        let err = UpdaterConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, UpdateError::Config(_)));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = UpdaterConfig::from_file(Path::new("/nonexistent/moult.toml")).unwrap_err();
        assert!(matches!(err, UpdateError::Io(_)));
    }
}
