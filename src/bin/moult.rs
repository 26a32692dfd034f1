//! Console entry point: startup marker cleanup, update check, confirmation
//! prompt, install.
//!
//! Status messages for the user go to stdout; tracing output goes to
//! stderr so piping the prompt stays clean.

use anyhow::Context;
use moult::config::UpdaterConfig;
use moult::installer::{InstallOutcome, Installer, is_affirmative};
use moult::registry::{HttpRegistry, resolve_update};
use moult::release::extract_notes;
use moult::version::Version;
use std::io::Write;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let config = load_config()?;
    let current = Version::parse_required(env!("CARGO_PKG_VERSION"))
        .context("package version is not a semantic version")?;

    let registry = HttpRegistry::new(config.clone());
    let installer = Installer::for_current_process(registry.agent().clone(), &config)
        .context("cannot locate the running executable")?;
    installer.clean_stale_marker();

    let release = match resolve_update(&registry, current) {
        Ok(Some(release)) => release,
        Ok(None) => {
            println!("The application is up-to-date.");
            return Ok(());
        }
        Err(e) => {
            tracing::warn!("{e}");
            println!("Check for updates failed.");
            return Ok(());
        }
    };

    println!("A new update is available!");
    if let Some(notes) = extract_notes(&release.body) {
        println!("{notes}");
    }

    let target = release
        .display_version()
        .map(|v| v.to_string())
        .unwrap_or_else(|| release.tag_name.clone());

    let confirm = || {
        if prompt_confirmation(&target) {
            println!("Downloading update...");
            true
        } else {
            false
        }
    };

    match installer.install(&release, confirm) {
        Ok(InstallOutcome::Applied) => {
            println!("Updated successfully! Restart the application to apply changes.");
        }
        Ok(InstallOutcome::Declined) => {
            println!("No: Keeping the current version.");
        }
        Err(e) => {
            tracing::error!("{e}");
            println!("Error: {e}");
        }
    }

    Ok(())
}

/// Asks for explicit consent on stdin. Any read failure counts as a
/// decline.
fn prompt_confirmation(version: &str) -> bool {
    print!("Do you want to update to {version}? [y/N]: ");
    let _ = std::io::stdout().flush();

    let mut line = String::new();
    if std::io::stdin().read_line(&mut line).is_err() {
        return false;
    }
    is_affirmative(&line)
}

/// A `moult.toml` next to the executable overrides the built-in defaults.
fn load_config() -> anyhow::Result<UpdaterConfig> {
    let path = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join("moult.toml")));

    match path {
        Some(path) if path.is_file() => UpdaterConfig::from_file(&path)
            .with_context(|| format!("invalid config at {}", path.display())),
        _ => Ok(UpdaterConfig::default()),
    }
}
