//! Moult: self-updating release client for desktop applications.
//!
//! Decides whether a newer release exists on a remote release registry,
//! surfaces its release notes, downloads the replacement executable, and
//! swaps it in place of the running binary — which the OS lets us rename
//! but not delete while it executes.
//!
//! # Architecture
//!
//! Three stages, each depending only on the previous:
//! - **Resolver** ([`registry`]): consults the pinned updater channel,
//!   then the latest release gated by semver comparison
//! - **Notes extraction** ([`release::extract_notes`]): pure text step for
//!   display between resolution and installation
//! - **Installer** ([`installer`]): staging download plus the two-step
//!   "rename-away, move-in" swap and its startup-time marker cleanup

pub mod config;
pub mod error;
pub mod installer;
pub mod registry;
pub mod release;
pub mod version;

pub use config::UpdaterConfig;
pub use error::{Result, UpdateError};
pub use installer::{InstallOutcome, Installer, Privilege};
pub use registry::{HttpRegistry, ReleaseSource, resolve_update};
pub use release::{Asset, Release, extract_notes};
pub use version::Version;
