//! Release registry client and update resolution.
//!
//! Two candidate channels are consulted in order: a pinned "updater"
//! release that unconditionally wins when it resolves (a forced-migration
//! escape hatch, deliberately exempt from version comparison), then the
//! registry's latest release gated by ordinary semver comparison against
//! the running version.

use crate::config::UpdaterConfig;
use crate::error::{Result, UpdateError};
use crate::release::Release;
use crate::version::Version;
use std::time::Duration;

/// Source of the two candidate releases. The HTTP registry implements
/// this; tests substitute an in-memory source.
pub trait ReleaseSource {
    /// The pinned forced-migration release.
    fn updater_release(&self) -> Result<Release>;
    /// The registry's most recent ordinary release.
    fn latest_release(&self) -> Result<Release>;
}

/// HTTP client for a GitHub-style release registry.
pub struct HttpRegistry {
    agent: ureq::Agent,
    config: UpdaterConfig,
}

impl HttpRegistry {
    pub fn new(config: UpdaterConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(Duration::from_secs(15))
            .timeout_read(Duration::from_secs(60))
            .build();
        Self { agent, config }
    }

    /// The underlying agent, shared with the installer for downloads.
    pub fn agent(&self) -> &ureq::Agent {
        &self.agent
    }

    /// Fetches and parses one release record. Only HTTP 200 counts as
    /// success; every other status or transport failure is `FetchFailed`.
    fn fetch_release(&self, url: &str) -> Result<Release> {
        let response = match self
            .agent
            .get(url)
            .set("User-Agent", &self.config.user_agent)
            .call()
        {
            Ok(response) => response,
            Err(ureq::Error::Status(code, _)) => {
                return Err(UpdateError::FetchFailed(format!(
                    "registry returned status {code} for {url}"
                )));
            }
            Err(e) => {
                return Err(UpdateError::FetchFailed(format!(
                    "registry unreachable: {e}"
                )));
            }
        };

        if response.status() != 200 {
            return Err(UpdateError::FetchFailed(format!(
                "unexpected status {} for {url}",
                response.status()
            )));
        }

        let body = response.into_string().map_err(|e| {
            UpdateError::FetchFailed(format!("cannot read registry response: {e}"))
        })?;
        serde_json::from_str(&body)
            .map_err(|e| UpdateError::FetchFailed(format!("malformed release record: {e}")))
    }
}

impl ReleaseSource for HttpRegistry {
    fn updater_release(&self) -> Result<Release> {
        self.fetch_release(&self.config.updater_release_url())
    }

    fn latest_release(&self) -> Result<Release> {
        self.fetch_release(&self.config.latest_release_url())
    }
}

/// Decides whether an update is warranted and which release to act on.
///
/// `Ok(None)` means up to date (inclusive of equality). A transport
/// failure on the latest-release fetch propagates as an error rather than
/// masquerading as "up to date".
pub fn resolve_update(
    source: &impl ReleaseSource,
    current: Version,
) -> Result<Option<Release>> {
    // The updater channel is authoritative when it resolves: no comparison
    // against the running version, so a pinned migration release can reach
    // installs that are numerically ahead of it.
    match source.updater_release() {
        Ok(release) if Version::find(&release.name).is_some() => {
            tracing::info!(
                "updater channel release {:?} takes precedence",
                release.tag_name
            );
            return Ok(Some(release));
        }
        Ok(release) => {
            tracing::debug!(
                "updater channel release name {:?} carries no version, ignoring",
                release.name
            );
        }
        Err(e) => tracing::debug!("updater channel not available: {e}"),
    }

    let latest = source.latest_release()?;

    // Tags on the ordinary channel are expected to be well-formed; a tag
    // that does not parse is treated like an absent update.
    let Some(latest_version) = Version::parse(&latest.tag_name) else {
        tracing::debug!("latest release tag {:?} is not a version", latest.tag_name);
        return Ok(None);
    };

    if current >= latest_version {
        tracing::debug!("current {current} >= latest {latest_version}, up to date");
        return Ok(None);
    }

    tracing::info!("update available: {latest_version} (running {current})");
    Ok(Some(latest))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use crate::release::Asset;

    struct FakeSource {
        updater: Option<Release>,
        latest: Option<Release>,
    }

    impl ReleaseSource for FakeSource {
        fn updater_release(&self) -> Result<Release> {
            self.updater
                .clone()
                .ok_or_else(|| UpdateError::FetchFailed("status 404".to_owned()))
        }

        fn latest_release(&self) -> Result<Release> {
            self.latest
                .clone()
                .ok_or_else(|| UpdateError::FetchFailed("registry unreachable".to_owned()))
        }
    }

    fn release(name: &str, tag: &str) -> Release {
        Release {
            name: name.to_owned(),
            tag_name: tag.to_owned(),
            body: String::new(),
            assets: vec![Asset {
                name: "update".to_owned(),
                browser_download_url: "https://example.test/update".to_owned(),
            }],
        }
    }

    #[test]
    fn updater_channel_wins_even_when_current_is_newer() {
        let source = FakeSource {
            updater: Some(release("Updater v1.0.0", "updater-v1")),
            latest: None,
        };

        let chosen = resolve_update(&source, Version::new(9, 0, 0)).unwrap();
        assert_eq!(chosen.unwrap().tag_name, "updater-v1");
    }

    #[test]
    fn updater_release_without_a_version_in_its_name_falls_through() {
        let source = FakeSource {
            updater: Some(release("Updater (retired)", "updater-v1")),
            latest: Some(release("App v2.0.0", "v2.0.0")),
        };

        let chosen = resolve_update(&source, Version::new(1, 0, 0)).unwrap();
        assert_eq!(chosen.unwrap().tag_name, "v2.0.0");
    }

    #[test]
    fn latest_newer_than_current_is_returned() {
        let source = FakeSource {
            updater: None,
            latest: Some(release("App v2.0.0", "v2.0.0")),
        };

        let chosen = resolve_update(&source, Version::new(1, 0, 0)).unwrap();
        assert_eq!(chosen.unwrap().tag_name, "v2.0.0");
    }

    #[test]
    fn equal_versions_are_up_to_date() {
        let source = FakeSource {
            updater: None,
            latest: Some(release("App v2.0.0", "v2.0.0")),
        };

        let chosen = resolve_update(&source, Version::new(2, 0, 0)).unwrap();
        assert!(chosen.is_none());
    }

    #[test]
    fn current_newer_than_latest_is_up_to_date() {
        let source = FakeSource {
            updater: None,
            latest: Some(release("App v2.0.0", "v2.0.0")),
        };

        let chosen = resolve_update(&source, Version::new(3, 1, 4)).unwrap();
        assert!(chosen.is_none());
    }

    #[test]
    fn unparseable_latest_tag_is_up_to_date() {
        let source = FakeSource {
            updater: None,
            latest: Some(release("nightly build", "nightly")),
        };

        let chosen = resolve_update(&source, Version::new(0, 1, 0)).unwrap();
        assert!(chosen.is_none());
    }

    #[test]
    fn transport_failure_on_latest_is_an_error_not_up_to_date() {
        let source = FakeSource {
            updater: None,
            latest: None,
        };

        let result = resolve_update(&source, Version::new(1, 0, 0));
        assert!(matches!(result, Err(UpdateError::FetchFailed(_))));
    }
}
