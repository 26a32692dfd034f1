//! Executable staging, download, and the two-step swap.
//!
//! The running executable cannot be deleted or overwritten while it
//! executes, but the OS does permit renaming it. The swap therefore renames
//! the current binary to `<name>~DELETE` and only then moves the staged
//! download onto the vacated name. The sequence is not atomic, but at no
//! point does the install directory lack a runnable binary: a crash between
//! the two operations leaves the old binary under the marker name, which
//! the next start cleans up.

use crate::config::UpdaterConfig;
use crate::error::{Result, UpdateError};
use crate::release::{Release, UPDATE_ASSET_NAME};
use std::path::{Path, PathBuf};

/// Suffix appended to the executable's full file name when it is renamed
/// away. Its presence on disk means a previous swap completed.
pub const DELETE_SUFFIX: &str = "~DELETE";

/// How the swap step is executed, decided by a writability probe just
/// before the swap rather than carried as separate installer state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Privilege {
    /// The process can write the executable and its directory directly.
    User,
    /// The swap must run through the platform escalation helper.
    Elevated,
}

/// Outcome of an installation attempt that did not error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallOutcome {
    /// The swap completed; a restart picks up the new binary.
    Applied,
    /// The user declined; nothing on disk was touched.
    Declined,
}

/// Stages and applies a replacement executable.
pub struct Installer {
    agent: ureq::Agent,
    user_agent: String,
    current_exe: PathBuf,
    staging_dir: PathBuf,
}

impl Installer {
    /// Creates an installer replacing the executable at `current_exe`.
    pub fn new(agent: ureq::Agent, config: &UpdaterConfig, current_exe: PathBuf) -> Self {
        Self {
            agent,
            user_agent: config.user_agent.clone(),
            current_exe,
            staging_dir: config.staging_path(),
        }
    }

    /// Creates an installer replacing the currently running executable.
    ///
    /// # Errors
    ///
    /// Returns an error if the running executable's path cannot be
    /// determined.
    pub fn for_current_process(agent: ureq::Agent, config: &UpdaterConfig) -> Result<Self> {
        let current_exe = std::env::current_exe()?;
        Ok(Self::new(agent, config, current_exe))
    }

    /// Deletes the `~DELETE` marker a previous swap left behind.
    ///
    /// Runs once at startup, before any update check. A failed deletion is
    /// logged and retried on the next run; the stale file is harmless.
    pub fn clean_stale_marker(&self) {
        let marker = marker_path(&self.current_exe);
        if !marker.exists() {
            return;
        }
        match std::fs::remove_file(&marker) {
            Ok(()) => tracing::debug!("removed stale marker {}", marker.display()),
            Err(e) => tracing::warn!("cannot delete stale marker {}: {e}", marker.display()),
        }
    }

    /// Downloads the release's `update` asset and swaps it in place of the
    /// current executable.
    ///
    /// `confirm` is consulted before anything touches the filesystem; a
    /// negative answer returns [`InstallOutcome::Declined`] with no side
    /// effects. Each subsequent step is a hard sequence point: the first
    /// failure aborts the installation.
    ///
    /// # Errors
    ///
    /// Returns [`UpdateError::MisconfiguredAssets`] when the release lacks
    /// an `update` asset, [`UpdateError::FetchFailed`] for download
    /// failures, and [`UpdateError::Filesystem`] for staging or swap
    /// failures.
    pub fn install(
        &self,
        release: &Release,
        confirm: impl FnOnce() -> bool,
    ) -> Result<InstallOutcome> {
        if !confirm() {
            tracing::info!("update declined, keeping the current version");
            return Ok(InstallOutcome::Declined);
        }

        let asset = release
            .executable_asset()
            .ok_or(UpdateError::MisconfiguredAssets)?;

        std::fs::create_dir_all(&self.staging_dir).map_err(|e| UpdateError::Filesystem {
            path: self.staging_dir.clone(),
            detail: format!("cannot create staging directory: {e}"),
        })?;

        let staged = self.staging_dir.join(UPDATE_ASSET_NAME);
        self.download(&asset.browser_download_url, &staged)?;

        let privilege = required_privilege(&self.current_exe);
        tracing::debug!("swapping with privilege {privilege:?}");
        swap(&staged, &self.current_exe, privilege)?;

        tracing::info!("executable replaced at {}", self.current_exe.display());
        Ok(InstallOutcome::Applied)
    }

    /// Downloads `url` to `dest`, overwriting any prior partial download.
    /// The transfer's outcome is judged by what actually landed on disk.
    fn download(&self, url: &str, dest: &Path) -> Result<()> {
        tracing::info!("downloading update from {url}");
        let response = self
            .agent
            .get(url)
            .set("User-Agent", &self.user_agent)
            .call()
            .map_err(|e| UpdateError::FetchFailed(format!("download failed: {e}")))?;

        let mut reader = response.into_reader();
        let mut file = std::fs::File::create(dest).map_err(|e| UpdateError::Filesystem {
            path: dest.to_owned(),
            detail: format!("cannot create staged file: {e}"),
        })?;
        std::io::copy(&mut reader, &mut file).map_err(|e| UpdateError::Filesystem {
            path: dest.to_owned(),
            detail: format!("download write failed: {e}"),
        })?;

        let len = std::fs::metadata(dest).map(|m| m.len()).unwrap_or(0);
        if len == 0 {
            return Err(UpdateError::FetchFailed(format!(
                "downloaded asset at {} is empty",
                dest.display()
            )));
        }

        tracing::debug!("staged {len} bytes at {}", dest.display());
        Ok(())
    }
}

/// Accepts exactly `y` or `yes`, case-insensitive, after trimming the line
/// ending. Everything else, including empty input, declines.
pub fn is_affirmative(input: &str) -> bool {
    matches!(input.trim().to_lowercase().as_str(), "y" | "yes")
}

/// Path of the rename-away marker for an executable: the full file name
/// with [`DELETE_SUFFIX`] appended.
pub fn marker_path(exe: &Path) -> PathBuf {
    let mut name = exe.as_os_str().to_owned();
    name.push(DELETE_SUFFIX);
    PathBuf::from(name)
}

/// Picks the privilege level for the swap: elevation is required when
/// either the executable itself or its containing directory refuses a
/// write probe.
fn required_privilege(exe: &Path) -> Privilege {
    let exe_writable = file_is_writable(exe);
    let dir_writable = exe.parent().is_some_and(dir_is_writable);
    if exe_writable && dir_writable {
        Privilege::User
    } else {
        Privilege::Elevated
    }
}

fn file_is_writable(path: &Path) -> bool {
    std::fs::OpenOptions::new().append(true).open(path).is_ok()
}

fn dir_is_writable(dir: &Path) -> bool {
    let probe = dir.join(format!(".moult-probe-{}", std::process::id()));
    match std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&probe)
    {
        Ok(_) => {
            let _ = std::fs::remove_file(&probe);
            true
        }
        Err(_) => false,
    }
}

/// The two-step swap: rename the target to its marker name, then move the
/// staged file onto the target path.
fn swap(staged: &Path, target: &Path, privilege: Privilege) -> Result<()> {
    match privilege {
        Privilege::User => swap_in_process(staged, target),
        Privilege::Elevated => swap_elevated(staged, target),
    }
}

fn swap_in_process(staged: &Path, target: &Path) -> Result<()> {
    let marker = marker_path(target);

    std::fs::rename(target, &marker).map_err(|e| UpdateError::Filesystem {
        path: target.to_owned(),
        detail: format!("cannot rename executable away: {e}"),
    })?;

    if let Err(e) = move_file(staged, target) {
        // Put the old binary back under its original name when we can.
        let _ = std::fs::rename(&marker, target);
        return Err(UpdateError::Filesystem {
            path: target.to_owned(),
            detail: format!("cannot move staged update in place: {e}"),
        });
    }

    set_executable(target)?;
    Ok(())
}

/// Both operations issued as one command so the escalation prompt appears
/// at most once. Their combined failure is reported as a single filesystem
/// error, not disambiguated further.
fn swap_elevated(staged: &Path, target: &Path) -> Result<()> {
    let marker = marker_path(target);
    let status = elevated_swap_command(staged, target, &marker)
        .status()
        .map_err(|e| UpdateError::Filesystem {
            path: target.to_owned(),
            detail: format!("cannot launch elevated swap: {e}"),
        })?;

    if !status.success() {
        return Err(UpdateError::Filesystem {
            path: target.to_owned(),
            detail: "elevated swap command failed".to_owned(),
        });
    }
    Ok(())
}

#[cfg(unix)]
fn elevated_swap_command(
    staged: &Path,
    target: &Path,
    marker: &Path,
) -> std::process::Command {
    // Paths travel as positional shell arguments, never spliced into the
    // script, so quotes and spaces in install paths cannot break it.
    let mut cmd = std::process::Command::new("sudo");
    cmd.args(["sh", "-c", r#"mv "$0" "$1" && mv "$2" "$0" && chmod 755 "$0""#])
        .arg(target)
        .arg(marker)
        .arg(staged);
    cmd
}

#[cfg(windows)]
fn elevated_swap_command(
    staged: &Path,
    target: &Path,
    marker: &Path,
) -> std::process::Command {
    // `ren` wants the bare new file name; `move` takes full paths.
    let marker_name = marker
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let script = format!(
        "ren \"{target}\" \"{marker_name}\" & move /Y \"{staged}\" \"{target}\"",
        target = target.display(),
        staged = staged.display(),
    );
    let mut cmd = std::process::Command::new("powershell");
    cmd.args([
        "-NoProfile",
        "-Command",
        &format!("Start-Process -Verb RunAs -Wait cmd -ArgumentList '/C {script}'"),
    ]);
    cmd
}

/// `rename` with a copy-and-delete fallback for cross-device moves; the
/// staging directory usually lives on the tmp filesystem.
fn move_file(from: &Path, to: &Path) -> std::io::Result<()> {
    match std::fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(_) => {
            std::fs::copy(from, to)?;
            let _ = std::fs::remove_file(from);
            Ok(())
        }
    }
}

/// Downloaded files land without the execute bit on Unix.
fn set_executable(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).map_err(
            |e| UpdateError::Filesystem {
                path: path.to_owned(),
                detail: format!("cannot set executable permission: {e}"),
            },
        )?;
    }
    let _ = path;
    Ok(())
}
